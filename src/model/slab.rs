use crate::component::sealed::Token;
use crate::component::{
    cumulative_extent, populate_layers, CellMap, CellMapHolder, Component, Contained,
    ContainedComp, ExternalCut, ExternalCutter, FixedComp, FixedOffset, FrameOwner, LayerInfo,
};
use crate::error::Result;
use crate::geometry::{Plane, Rule};
use crate::math::{Point3, Vector3};
use crate::param::ParamSource;
use crate::registry::Simulation;

const LINK_NAMES: [&str; 6] = ["front", "back", "left", "right", "base", "top"];

/// A rectangular block made of layers stacked along its Y axis.
///
/// The front face sits on the frame origin. Local surfaces: 1 front,
/// 3/4 left/right, 5/6 base/top, `11 + i` back face of layer `i`.
/// A supplied `"front"` cut replaces surface 1.
#[derive(Debug, Clone)]
pub struct LayeredSlab {
    fixed: FixedComp,
    cell_map: CellMap,
    contained: ContainedComp,
    cut: ExternalCut,
    offset: FixedOffset,
    width: f64,
    height: f64,
    layers: Vec<LayerInfo>,
}

impl LayeredSlab {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, LINK_NAMES.len()),
            cell_map: CellMap::new(name),
            contained: ContainedComp::new(),
            cut: ExternalCut::new(name),
            offset: FixedOffset::default(),
            width: 0.0,
            height: 0.0,
            layers: Vec::new(),
        }
    }

    /// Layers read by `populate`.
    #[must_use]
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    fn total_thick(&self) -> f64 {
        self.layers.iter().map(|l| l.thick).sum()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn back_surf(layer: usize) -> i32 {
        11 + layer as i32
    }

    fn add_plane(
        &self,
        sim: &mut Simulation,
        local: i32,
        at: Vector3,
        normal: Vector3,
    ) -> Result<()> {
        let frame = self.fixed.frame();
        let plane = Plane::from_normal(frame.to_world(&at), frame.direction(&normal))?;
        sim.add_surface(self.fixed.surf(local)?, plane)
    }

    fn front_rule(&self) -> Result<Rule> {
        if self.cut.has_cut("front") {
            return Ok(self.cut.rule_or_all("front"));
        }
        self.fixed.rule("1")
    }
}

impl FrameOwner for LayeredSlab {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp {
        &mut self.fixed
    }
}

impl CellMapHolder for LayeredSlab {
    fn cell_map(&self) -> &CellMap {
        &self.cell_map
    }

    fn cell_map_mut(&mut self, _: Token) -> &mut CellMap {
        &mut self.cell_map
    }
}

impl Contained for LayeredSlab {
    fn contained(&self) -> &ContainedComp {
        &self.contained
    }

    fn contained_mut(&mut self, _: Token) -> &mut ContainedComp {
        &mut self.contained
    }
}

impl ExternalCutter for LayeredSlab {
    fn external_cut(&self) -> &ExternalCut {
        &self.cut
    }

    fn external_cut_mut(&mut self, _: Token) -> &mut ExternalCut {
        &mut self.cut
    }
}

impl Component for LayeredSlab {
    fn populate(&mut self, params: &dyn ParamSource) -> Result<()> {
        let name = self.fixed.name().to_owned();
        self.offset = FixedOffset::populate(params, &name)?;
        self.width = params.get_positive(&name, &format!("{name}Width"))?;
        self.height = params.get_positive(&name, &format!("{name}Height"))?;
        let n_layer = params.get_usize(&name, &format!("{name}NLayer"))?;
        if n_layer == 0 {
            return Err(crate::error::ConfigurationError::OutOfRange {
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
        let (w, h) = (self.width / 2.0, self.height / 2.0);
        self.add_plane(sim, 1, Vector3::zeros(), Vector3::y())?;
        self.add_plane(sim, 3, Vector3::new(-w, 0.0, 0.0), Vector3::x())?;
        self.add_plane(sim, 4, Vector3::new(w, 0.0, 0.0), Vector3::x())?;
        self.add_plane(sim, 5, Vector3::new(0.0, 0.0, -h), Vector3::z())?;
        self.add_plane(sim, 6, Vector3::new(0.0, 0.0, h), Vector3::z())?;
        for (i, y) in cumulative_extent(&self.layers, 0.0).into_iter().enumerate() {
            self.add_plane(sim, Self::back_surf(i), Vector3::new(0.0, y, 0.0), Vector3::y())?;
        }
        Ok(())
    }

    fn create_objects(&mut self, sim: &mut Simulation) -> Result<()> {
        let sides = self.fixed.rule("3 -4 5 -6")?;
        let boundary = self.contained.boundary().cloned().unwrap_or_default();
        let mut front = self.front_rule()?;
        for (i, layer) in self.layers.iter().enumerate() {
            let back = Rule::Surf(-self.fixed.surf(Self::back_surf(i))?);
            let rule = sides.clone().and(front).and(back.clone()).and(boundary.clone());
            let id = self.fixed.next_cell_number()?;
            sim.add_cell(id, rule, layer.material)?;
            if layer.temperature > 0.0 {
                sim.cell_mut(id)?.temperature = Some(layer.temperature);
            }
            self.cell_map.add_cell("layer", id);
            front = back.complement();
        }
        let last = Rule::Surf(-self.fixed.surf(Self::back_surf(self.layers.len() - 1))?);
        let outer = sides.and(self.front_rule()?).and(last);
        self.contained.add_outer_region(outer);
        Ok(())
    }

    fn create_links(&mut self) -> Result<()> {
        let frame = self.fixed.frame().clone();
        let (w, h, t) = (self.width / 2.0, self.height / 2.0, self.total_thick());
        let mid = t / 2.0;
        let faces: [(Vector3, Vector3, i32); 6] = [
            (Vector3::zeros(), -Vector3::y(), -1),
            (Vector3::new(0.0, t, 0.0), Vector3::y(), Self::back_surf(self.layers.len() - 1)),
            (Vector3::new(-w, mid, 0.0), -Vector3::x(), -3),
            (Vector3::new(w, mid, 0.0), Vector3::x(), 4),
            (Vector3::new(0.0, mid, -h), -Vector3::z(), -5),
            (Vector3::new(0.0, mid, h), Vector3::z(), 6),
        ];
        for (index, (at, axis, local)) in faces.into_iter().enumerate() {
            let point: Point3 = frame.to_world(&at);
            self.fixed.set_connect(index, point, frame.direction(&axis))?;
            let surf = local.signum() * self.fixed.surf(local.abs())?;
            self.fixed.set_link_surf(index, Rule::Surf(surf))?;
            self.fixed.name_link(index, LINK_NAMES[index])?;
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

    fn as_external_cut_mut(&mut self) -> Option<&mut dyn ExternalCutter> {
        Some(self)
    }
}
