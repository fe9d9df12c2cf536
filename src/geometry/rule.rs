use std::collections::BTreeSet;
use std::fmt;

use crate::error::{GeometryError, ReferenceError, Result};
use crate::math::Point3;

use super::surface::{HalfSpace, SurfaceKind};

/// Resolves surface numbers to descriptors for point evaluation.
pub trait SurfaceLookup {
    /// Returns the surface registered under `id`, if any.
    fn surface(&self, id: i32) -> Option<&SurfaceKind>;
}

/// A region of space written as a boolean combination of signed surface
/// references.
///
/// A positive reference selects the positive sense of a surface, a negative
/// one the negative sense. Intersection binds tighter than union, matching the
/// conventional text form `1 -2 (3 : -4)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// One side of a single surface.
    Surf(i32),
    /// All sub-rules hold. An empty intersection is all of space.
    Intersection(Vec<Rule>),
    /// Any sub-rule holds. An empty union is the empty set.
    Union(Vec<Rule>),
    /// The sub-rule does not hold.
    Complement(Box<Rule>),
}

impl Default for Rule {
    fn default() -> Self {
        Self::all()
    }
}

impl Rule {
    /// The unrestricted region.
    #[must_use]
    pub fn all() -> Self {
        Self::Intersection(Vec::new())
    }

    /// Returns `true` for the unrestricted region.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::Intersection(items) if items.is_empty())
    }

    /// Intersects two rules, flattening nested intersections.
    #[must_use]
    pub fn and(self, other: Rule) -> Self {
        let mut items = match self {
            Self::Intersection(items) => items,
            rule => vec![rule],
        };
        match other {
            Self::Intersection(more) => items.extend(more),
            rule => items.push(rule),
        }
        collapse(items, Self::Intersection)
    }

    /// Unites two rules, flattening nested unions.
    #[must_use]
    pub fn or(self, other: Rule) -> Self {
        let mut items = match self {
            Self::Union(items) => items,
            rule => vec![rule],
        };
        match other {
            Self::Union(more) => items.extend(more),
            rule => items.push(rule),
        }
        collapse(items, Self::Union)
    }

    /// Returns the complement of this rule. A single surface simply flips sense.
    #[must_use]
    pub fn complement(&self) -> Self {
        match self {
            Self::Surf(n) => Self::Surf(-n),
            Self::Complement(inner) => (**inner).clone(),
            rule => Self::Complement(Box::new(rule.clone())),
        }
    }

    /// Unsigned surface numbers referenced anywhere in the rule, ascending.
    #[must_use]
    pub fn surfaces(&self) -> BTreeSet<i32> {
        let mut out = BTreeSet::new();
        self.collect_surfaces(&mut out);
        out
    }

    fn collect_surfaces(&self, out: &mut BTreeSet<i32>) {
        match self {
            Self::Surf(n) => {
                out.insert(n.abs());
            }
            Self::Intersection(items) | Self::Union(items) => {
                for item in items {
                    item.collect_surfaces(out);
                }
            }
            Self::Complement(inner) => inner.collect_surfaces(out),
        }
    }

    /// Tests whether `point` lies inside the region.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced surface is not known to `lookup`.
    pub fn contains(&self, point: &Point3, lookup: &impl SurfaceLookup) -> Result<bool> {
        match self {
            Self::Surf(n) => {
                let surface = lookup
                    .surface(n.abs())
                    .ok_or(ReferenceError::UnknownSurface(n.abs()))?;
                Ok(surface.is_positive(point) == (*n > 0))
            }
            Self::Intersection(items) => {
                for item in items {
                    if !item.contains(point, lookup)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Union(items) => {
                for item in items {
                    if item.contains(point, lookup)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Complement(inner) => Ok(!inner.contains(point, lookup)?),
        }
    }

    /// Parses a region expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed.
    pub fn parse(expr: &str) -> Result<Self> {
        Self::composite(0, expr)
    }

    /// Parses a region expression written in component-local surface numbers,
    /// shifting every reference by `offset` while keeping its sign.
    ///
    /// `Rule::composite(10000, "1 -2")` is `10001 -10002`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed.
    pub fn composite(offset: i32, expr: &str) -> Result<Self> {
        let tokens = tokenize(expr)?;
        let mut parser = Parser {
            expr,
            tokens: &tokens,
            pos: 0,
            offset,
        };
        let rule = parser.union()?;
        if parser.pos != tokens.len() {
            return Err(parser.fail("unbalanced `)`"));
        }
        Ok(rule)
    }
}

fn collapse(mut items: Vec<Rule>, wrap: fn(Vec<Rule>) -> Rule) -> Rule {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surf(n) => write!(f, "{n}"),
            Self::Intersection(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match item {
                        Self::Union(inner) if inner.len() > 1 => write!(f, "({item})")?,
                        _ => write!(f, "{item}")?,
                    }
                }
                Ok(())
            }
            Self::Union(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" : ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Complement(inner) => write!(f, "#({inner})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(i32),
    Open,
    Close,
    Colon,
    Hash,
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let bad = |reason: String| GeometryError::BadRegion {
        expr: expr.to_owned(),
        reason,
    };
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            ':' => tokens.push(Token::Colon),
            '#' => tokens.push(Token::Hash),
            '-' | '+' | '0'..='9' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let text = &expr[start..end];
                let n: i32 = text
                    .parse()
                    .map_err(|_| bad(format!("bad surface number `{text}`")))?;
                if n == 0 {
                    return Err(bad("surface number 0".into()).into());
                }
                tokens.push(Token::Number(n));
            }
            other => return Err(bad(format!("unexpected character `{other}`")).into()),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    expr: &'a str,
    tokens: &'a [Token],
    pos: usize,
    offset: i32,
}

impl Parser<'_> {
    fn fail(&self, reason: &str) -> crate::error::CellforgeError {
        GeometryError::BadRegion {
            expr: self.expr.to_owned(),
            reason: reason.to_owned(),
        }
        .into()
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn union(&mut self) -> Result<Rule> {
        let mut items = vec![self.intersection()?];
        while self.peek() == Some(Token::Colon) {
            self.pos += 1;
            items.push(self.intersection()?);
        }
        Ok(collapse(items, Rule::Union))
    }

    fn intersection(&mut self) -> Result<Rule> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Colon | Token::Close) {
                break;
            }
            items.push(self.factor()?);
        }
        if items.is_empty() {
            return Err(self.fail("empty term"));
        }
        Ok(collapse(items, Rule::Intersection))
    }

    fn factor(&mut self) -> Result<Rule> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                let shifted = n
                    .checked_abs()
                    .and_then(|a| a.checked_add(self.offset))
                    .filter(|&a| a > 0)
                    .ok_or_else(|| self.fail("surface number out of range"))?;
                Ok(Rule::Surf(n.signum() * shifted))
            }
            Some(Token::Hash) => {
                self.pos += 1;
                Ok(Rule::Complement(Box::new(self.factor()?)))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.union()?;
                if self.peek() != Some(Token::Close) {
                    return Err(self.fail("missing `)`"));
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(self.fail("expected surface, `(` or `#`")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::geometry::surface::Plane;
    use crate::math::Vector3;

    struct Table(HashMap<i32, SurfaceKind>);

    impl SurfaceLookup for Table {
        fn surface(&self, id: i32) -> Option<&SurfaceKind> {
            self.0.get(&id)
        }
    }

    /// Unit box: 1..6 are planes x=0, x=1, y=0, y=1, z=0, z=1 with +axis normals.
    fn unit_box() -> Table {
        let mut m = HashMap::new();
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        for (i, axis) in axes.iter().enumerate() {
            let lo = Plane::from_normal(Point3::origin(), *axis).unwrap();
            let hi = Plane::from_normal(Point3::from(*axis), *axis).unwrap();
            let n = i32::try_from(2 * i).unwrap();
            m.insert(n + 1, lo.into());
            m.insert(n + 2, hi.into());
        }
        Table(m)
    }

    #[test]
    fn parse_and_render() {
        let r = Rule::parse("1 -2 (3 : -4) #(5 6)").unwrap();
        assert_eq!(r.to_string(), "1 -2 (3 : -4) #(5 6)");
    }

    #[test]
    fn composite_shifts_keeping_sign() {
        let r = Rule::composite(10000, "1 -2:3").unwrap();
        assert_eq!(r.to_string(), "10001 -10002 : 10003");
        let ids: Vec<i32> = r.surfaces().into_iter().collect();
        assert_eq!(ids, vec![10001, 10002, 10003]);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(Rule::parse("1 (2").is_err());
        assert!(Rule::parse("1 2)").is_err());
        assert!(Rule::parse("1 : ").is_err());
        assert!(Rule::parse("1 x").is_err());
        assert!(Rule::parse("0").is_err());
    }

    #[test]
    fn shifted_numbers_must_fit() {
        assert!(Rule::parse("-2147483648").is_err());
        assert!(Rule::composite(i32::MAX - 5, "1 -6").is_err());
        let near = Rule::composite(i32::MAX - 5, "-5").unwrap();
        assert_eq!(near, Rule::Surf(-(i32::MAX)));
    }

    #[test]
    fn contains_box_interior() {
        let t = unit_box();
        let inside = Rule::parse("1 -2 3 -4 5 -6").unwrap();
        assert!(inside.contains(&Point3::new(0.5, 0.5, 0.5), &t).unwrap());
        assert!(!inside.contains(&Point3::new(1.5, 0.5, 0.5), &t).unwrap());
        assert!(inside
            .complement()
            .contains(&Point3::new(1.5, 0.5, 0.5), &t)
            .unwrap());
    }

    #[test]
    fn contains_union() {
        let t = unit_box();
        let r = Rule::parse("-1 : 2").unwrap();
        assert!(r.contains(&Point3::new(-1.0, 0.0, 0.0), &t).unwrap());
        assert!(!r.contains(&Point3::new(0.5, 0.0, 0.0), &t).unwrap());
    }

    #[test]
    fn unknown_surface_is_an_error() {
        let t = unit_box();
        assert!(Rule::Surf(99).contains(&Point3::origin(), &t).is_err());
    }

    #[test]
    fn and_or_flatten() {
        let r = Rule::Surf(1).and(Rule::Surf(-2)).and(Rule::Surf(3));
        assert_eq!(r, Rule::Intersection(vec![Rule::Surf(1), Rule::Surf(-2), Rule::Surf(3)]));
        let u = Rule::Surf(1).or(Rule::Surf(2));
        assert_eq!(Rule::all().and(u.clone()), u);
        assert_eq!(Rule::Surf(4).and(u).to_string(), "4 (1 : 2)");
    }

    #[test]
    fn complement_of_surface_flips_sense() {
        assert_eq!(Rule::Surf(7).complement(), Rule::Surf(-7));
        let r = Rule::parse("1 2").unwrap();
        assert_eq!(r.complement().complement(), r);
    }
}
