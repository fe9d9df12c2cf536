use crate::component::sealed::Token;
use crate::component::{
    cumulative_extent, populate_layers, CellMap, CellMapHolder, Component, Contained,
    ContainedComp, FixedComp, FixedOffset, FrameOwner, LayerInfo,
};
use crate::error::{ConfigurationError, Result};
use crate::geometry::{Rule, Sphere};
use crate::math::Vector3;
use crate::param::ParamSource;
use crate::registry::Simulation;

/// Concentric spherical shells around a filled core.
///
/// Local surface 7 bounds the core; `17 + i` is the outside of shell `i`.
/// Links 0 and 1 sit on the outermost sphere along -Y and +Y.
#[derive(Debug, Clone)]
pub struct ShellStack {
    fixed: FixedComp,
    cell_map: CellMap,
    contained: ContainedComp,
    offset: FixedOffset,
    radius: f64,
    inner_mat: i32,
    layers: Vec<LayerInfo>,
}

impl ShellStack {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, 2),
            cell_map: CellMap::new(name),
            contained: ContainedComp::new(),
            offset: FixedOffset::default(),
            radius: 0.0,
            inner_mat: 0,
            layers: Vec::new(),
        }
    }

    /// Radius of the outermost sphere.
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.radius + self.layers.iter().map(|l| l.thick).sum::<f64>()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn shell_surf(layer: usize) -> i32 {
        17 + layer as i32
    }

    fn last_surf(&self) -> Result<i32> {
        self.fixed.surf(Self::shell_surf(self.layers.len() - 1))
    }
}

impl FrameOwner for ShellStack {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp {
        &mut self.fixed
    }
}

impl CellMapHolder for ShellStack {
    fn cell_map(&self) -> &CellMap {
        &self.cell_map
    }

    fn cell_map_mut(&mut self, _: Token) -> &mut CellMap {
        &mut self.cell_map
    }
}

impl Contained for ShellStack {
    fn contained(&self) -> &ContainedComp {
        &self.contained
    }

    fn contained_mut(&mut self, _: Token) -> &mut ContainedComp {
        &mut self.contained
    }
}

impl Component for ShellStack {
    fn populate(&mut self, params: &dyn ParamSource) -> Result<()> {
        let name = self.fixed.name().to_owned();
        self.offset = FixedOffset::populate(params, &name)?;
        self.radius = params.get_positive(&name, &format!("{name}Radius"))?;
        self.inner_mat = params.get_material(&name, &format!("{name}InnerMat"))?;
        let n_layer = params.get_usize(&name, &format!("{name}NLayer"))?;
        if n_layer == 0 {
            return Err(ConfigurationError::OutOfRange {
                component: name.clone(),
                key: format!("{name}NLayer"),
                value: 0.0,
                reason: "must be at least 1",
            }
            .into());
        }
        populate_layers(&mut self.layers, params, &name, n_layer)
    }

    fn create_unit_vector(&mut self, parent: &dyn FrameOwner, link_index: usize) -> Result<()> {
        self.fixed.create_unit_vector(parent, link_index, &self.offset)
    }

    fn create_surfaces(&mut self, sim: &mut Simulation) -> Result<()> {
        let centre = *self.fixed.frame().origin();
        sim.add_surface(self.fixed.surf(7)?, Sphere::new(centre, self.radius)?)?;
        let radii = cumulative_extent(&self.layers, self.radius);
        for (i, r) in radii.into_iter().enumerate() {
            sim.add_surface(self.fixed.surf(Self::shell_surf(i))?, Sphere::new(centre, r)?)?;
        }
        Ok(())
    }

    fn create_objects(&mut self, sim: &mut Simulation) -> Result<()> {
        let boundary = self.contained.boundary().cloned().unwrap_or_default();

        let core = self.fixed.surf(7)?;
        let id = self.fixed.next_cell_number()?;
        sim.add_cell(id, Rule::Surf(-core).and(boundary.clone()), self.inner_mat)?;
        self.cell_map.add_cell("inner", id);

        let mut inside = core;
        for (i, layer) in self.layers.iter().enumerate() {
            let outside = self.fixed.surf(Self::shell_surf(i))?;
            let rule = Rule::Surf(inside)
                .and(Rule::Surf(-outside))
                .and(boundary.clone());
            let id = self.fixed.next_cell_number()?;
            sim.add_cell(id, rule, layer.material)?;
            if layer.temperature > 0.0 {
                sim.cell_mut(id)?.temperature = Some(layer.temperature);
            }
            self.cell_map.add_cell("shell", id);
            inside = outside;
        }

        self.contained.add_outer_region(Rule::Surf(-inside));
        Ok(())
    }

    fn create_links(&mut self) -> Result<()> {
        let frame = self.fixed.frame().clone();
        let r = self.outer_radius();
        let last = self.last_surf()?;
        for (index, (sign, name)) in [(-1.0, "front"), (1.0, "back")].into_iter().enumerate() {
            let axis = frame.direction(&Vector3::new(0.0, sign, 0.0));
            let point = frame.to_world(&Vector3::new(0.0, sign * r, 0.0));
            self.fixed.set_connect(index, point, axis)?;
            self.fixed.set_link_surf(index, Rule::Surf(last))?;
            self.fixed.name_link(index, name)?;
        }
        Ok(())
    }

    fn as_cell_map(&self) -> Option<&dyn CellMapHolder> {
        Some(self)
    }

    fn as_contained(&self) -> Option<&dyn Contained> {
        Some(self)
    }

    fn as_contained_mut(&mut self) -> Option<&mut dyn Contained> {
        Some(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::component::BuildState;
    use crate::math::Point3;
    use crate::param::ParamTable;

    fn params() -> ParamTable {
        let mut p = ParamTable::new()
            .with("tankYStep", 10.0)
            .with("tankRadius", 5.0)
            .with("tankInnerMat", "Water")
            .with("tankNLayer", 2_i64)
            .with("tankThick0", 1.0)
            .with("tankMat0", "Steel")
            .with("tankThick1", 2.0)
            .with("tankMat1", "Void");
        p.add_material("Water", 11);
        p.add_material("Steel", 3);
        p
    }

    #[test]
    fn shells_wrap_the_core() {
        let mut sim = Simulation::new();
        let mut tank = ShellStack::new("tank");
        tank.create_all(&mut sim, &params(), &FixedComp::world(), 0).unwrap();
        assert_eq!(tank.state(), BuildState::Built);
        assert_eq!(sim.surface_count(), 3);
        assert_eq!(tank.cells("shell").unwrap().len(), 2);

        let core = sim.cell(tank.cell("inner", 0).unwrap()).unwrap();
        assert_eq!(core.material, 11);
        assert_eq!(core.rule.to_string(), "-10007");
        let outer = sim.cell(tank.cell("shell", 1).unwrap()).unwrap();
        assert_eq!(outer.rule.to_string(), "10017 -10018");
        assert_eq!(outer.material, 0);
        assert_relative_eq!(tank.outer_radius(), 8.0);
    }

    #[test]
    fn links_on_outer_sphere() {
        let mut sim = Simulation::new();
        let mut tank = ShellStack::new("tank");
        tank.create_all(&mut sim, &params(), &FixedComp::world(), 0).unwrap();
        let front = tank.link(0).unwrap();
        assert_relative_eq!(front.point, Point3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(front.axis, -Vector3::y(), epsilon = 1e-12);
        let back = tank.link(1).unwrap();
        assert_relative_eq!(back.point, Point3::new(0.0, 18.0, 0.0), epsilon = 1e-12);
        assert_eq!(back.surface, Rule::Surf(10_018));

        assert!(tank.is_inside(&Point3::new(0.0, 17.0, 0.0), &sim).unwrap());
        assert!(!tank.is_inside(&Point3::new(0.0, 19.0, 0.0), &sim).unwrap());
    }

    #[test]
    fn boundary_cut_applies_to_every_cell() {
        let mut sim = Simulation::new();
        let mut tank = ShellStack::new("tank");
        tank.add_boundary_cut(Rule::Surf(10_007)).unwrap();
        tank.create_all(&mut sim, &params(), &FixedComp::world(), 0).unwrap();
        let core = sim.cell(tank.cell("inner", 0).unwrap()).unwrap();
        assert_eq!(core.rule.to_string(), "-10007 10007");
    }
}
