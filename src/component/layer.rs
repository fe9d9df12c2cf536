use crate::error::Result;
use crate::param::ParamSource;

/// Thickness, material and temperature of one shell of a layered component.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerInfo {
    pub thick: f64,
    pub material: i32,
    /// Kelvin; zero means the transport code's ambient temperature.
    pub temperature: f64,
}

impl LayerInfo {
    /// Reads layer `index` of component `name` from `<name>Thick{i}`,
    /// `<name>Mat{i}` and the optional `<name>Temp{i}`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the thickness is missing or not
    /// positive, or the material is missing or unknown.
    pub fn populate(params: &dyn ParamSource, name: &str, index: usize) -> Result<Self> {
        Ok(Self {
            thick: params.get_positive(name, &format!("{name}Thick{index}"))?,
            material: params.get_material(name, &format!("{name}Mat{index}"))?,
            temperature: params.get_f64_or(name, &format!("{name}Temp{index}"), 0.0)?,
        })
    }
}

/// Resizes `layers` to `count` entries and fills each from the parameters.
///
/// # Errors
///
/// Returns the first configuration error met.
pub fn populate_layers(
    layers: &mut Vec<LayerInfo>,
    params: &dyn ParamSource,
    name: &str,
    count: usize,
) -> Result<()> {
    layers.resize(count, LayerInfo::default());
    for (index, layer) in layers.iter_mut().enumerate() {
        *layer = LayerInfo::populate(params, name, index)?;
    }
    Ok(())
}

/// Running outer extents of each layer: `[t0, t0+t1, ...]` plus `start`.
#[must_use]
pub fn cumulative_extent(layers: &[LayerInfo], start: f64) -> Vec<f64> {
    layers
        .iter()
        .scan(start, |acc, layer| {
            *acc += layer.thick;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::param::ParamTable;

    #[test]
    fn layers_fill_from_parameters() {
        let mut params = ParamTable::new()
            .with("shieldThick0", 1.0)
            .with("shieldMat0", "Steel")
            .with("shieldThick1", 2.5)
            .with("shieldMat1", "Void")
            .with("shieldTemp1", 300.0);
        params.add_material("Steel", 3);
        let mut layers = Vec::new();
        populate_layers(&mut layers, &params, "shield", 2).unwrap();
        assert_eq!(layers[0].material, 3);
        assert_eq!(layers[1].material, 0);
        assert!((layers[1].temperature - 300.0).abs() < 1e-12);
        assert_eq!(cumulative_extent(&layers, 4.0), vec![5.0, 7.5]);
    }

    #[test]
    fn missing_layer_is_a_configuration_error() {
        let params = ParamTable::new().with("shieldThick0", 1.0);
        let mut layers = Vec::new();
        assert!(populate_layers(&mut layers, &params, "shield", 1).is_err());
    }

    #[test]
    fn negative_thickness_is_rejected() {
        let mut params = ParamTable::new()
            .with("shieldThick0", -1.0)
            .with("shieldMat0", "Steel");
        params.add_material("Steel", 3);
        let mut layers = Vec::new();
        assert!(populate_layers(&mut layers, &params, "shield", 1).is_err());
    }
}
