use crate::component::sealed::Token;
use crate::component::{
    cumulative_extent, populate_layers, CellMap, CellMapHolder, Component, Contained,
    ContainedComp, ExternalCut, ExternalCutter, FixedComp, FixedOffset, FrameOwner, LayerInfo,
};
use crate::error::{ConfigurationError, Result};
use crate::geometry::{Cylinder, Plane, Rule};
use crate::math::Vector3;
use crate::param::ParamSource;
use crate::registry::Simulation;

const LINK_NAMES: [&str; 3] = ["front", "back", "side"];

/// A filled cylinder along the frame's Y axis wrapped in coaxial layers.
///
/// Local surfaces: 1/2 end planes, 7 core, `17 + i` outside of layer `i`.
/// A supplied `"front"` cut replaces plane 1.
#[derive(Debug, Clone)]
pub struct LayeredTube {
    fixed: FixedComp,
    cell_map: CellMap,
    contained: ContainedComp,
    cut: ExternalCut,
    offset: FixedOffset,
    length: f64,
    radius: f64,
    inner_mat: i32,
    layers: Vec<LayerInfo>,
}

impl LayeredTube {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, LINK_NAMES.len()),
            cell_map: CellMap::new(name),
            contained: ContainedComp::new(),
            cut: ExternalCut::new(name),
            offset: FixedOffset::default(),
            length: 0.0,
            radius: 0.0,
            inner_mat: 0,
            layers: Vec::new(),
        }
    }

    /// Radius of the outermost layer.
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.radius + self.layers.iter().map(|l| l.thick).sum::<f64>()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn layer_surf(layer: usize) -> i32 {
        17 + layer as i32
    }

    fn front_rule(&self) -> Result<Rule> {
        if self.cut.has_cut("front") {
            return self.cut.rule("front").cloned();
        }
        self.fixed.rule("1")
    }
}

impl FrameOwner for LayeredTube {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp {
        &mut self.fixed
    }
}

impl CellMapHolder for LayeredTube {
    fn cell_map(&self) -> &CellMap {
        &self.cell_map
    }

    fn cell_map_mut(&mut self, _: Token) -> &mut CellMap {
        &mut self.cell_map
    }
}

impl Contained for LayeredTube {
    fn contained(&self) -> &ContainedComp {
        &self.contained
    }

    fn contained_mut(&mut self, _: Token) -> &mut ContainedComp {
        &mut self.contained
    }
}

impl ExternalCutter for LayeredTube {
    fn external_cut(&self) -> &ExternalCut {
        &self.cut
    }

    fn external_cut_mut(&mut self, _: Token) -> &mut ExternalCut {
        &mut self.cut
    }
}

impl Component for LayeredTube {
    fn populate(&mut self, params: &dyn ParamSource) -> Result<()> {
        let name = self.fixed.name().to_owned();
        self.offset = FixedOffset::populate(params, &name)?;
        self.length = params.get_positive(&name, &format!("{name}Length"))?;
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
        let frame = self.fixed.frame();
        let (origin, axis) = (*frame.origin(), *frame.y());
        let back = frame.to_world(&Vector3::new(0.0, self.length, 0.0));
        sim.add_surface(self.fixed.surf(1)?, Plane::from_normal(origin, axis)?)?;
        sim.add_surface(self.fixed.surf(2)?, Plane::from_normal(back, axis)?)?;
        sim.add_surface(self.fixed.surf(7)?, Cylinder::new(origin, axis, self.radius)?)?;
        for (i, r) in cumulative_extent(&self.layers, self.radius).into_iter().enumerate() {
            let id = self.fixed.surf(Self::layer_surf(i))?;
            sim.add_surface(id, Cylinder::new(origin, axis, r)?)?;
        }
        Ok(())
    }

    fn create_objects(&mut self, sim: &mut Simulation) -> Result<()> {
        let ends = self
            .front_rule()?
            .and(Rule::Surf(-self.fixed.surf(2)?))
            .and(self.contained.boundary().cloned().unwrap_or_default());

        let core = self.fixed.surf(7)?;
        let id = self.fixed.next_cell_number()?;
        sim.add_cell(id, ends.clone().and(Rule::Surf(-core)), self.inner_mat)?;
        self.cell_map.add_cell("inner", id);

        let mut inside = core;
        for (i, layer) in self.layers.iter().enumerate() {
            let outside = self.fixed.surf(Self::layer_surf(i))?;
            let rule = ends
                .clone()
                .and(Rule::Surf(inside))
                .and(Rule::Surf(-outside));
            let id = self.fixed.next_cell_number()?;
            sim.add_cell(id, rule, layer.material)?;
            if layer.temperature > 0.0 {
                sim.cell_mut(id)?.temperature = Some(layer.temperature);
            }
            self.cell_map.add_cell("layer", id);
            inside = outside;
        }

        self.contained.add_outer_region(ends.and(Rule::Surf(-inside)));
        Ok(())
    }

    fn create_links(&mut self) -> Result<()> {
        let frame = self.fixed.frame().clone();
        let (length, r) = (self.length, self.outer_radius());
        let outer = Self::layer_surf(self.layers.len() - 1);
        let faces = [
            (Vector3::zeros(), -Vector3::y(), -1),
            (Vector3::new(0.0, length, 0.0), Vector3::y(), 2),
            (Vector3::new(r, length / 2.0, 0.0), Vector3::x(), outer),
        ];
        for (index, (at, axis, local)) in faces.into_iter().enumerate() {
            self.fixed.set_connect(index, frame.to_world(&at), frame.direction(&axis))?;
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
