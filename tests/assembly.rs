#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use cellforge::assembly::Assembly;
use cellforge::component::{CellMapHolder, Component, FrameOwner};
use cellforge::geometry::Rule;
use cellforge::math::Point3;
use cellforge::model::{LayeredSlab, ShellStack, WorldOrigin};
use cellforge::param::ParamTable;
use cellforge::physics::CellValueSet;
use cellforge::registry::Simulation;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn params() -> ParamTable {
    let mut p = ParamTable::new()
        .with("wallWidth", 20.0)
        .with("wallHeight", 20.0)
        .with("wallNLayer", 3_i64)
        .with("wallThick0", 1.0)
        .with("wallMat0", "Steel")
        .with("wallThick1", 1.0)
        .with("wallMat1", "Steel")
        .with("wallThick2", 2.0)
        .with("wallMat2", "Concrete")
        .with("tankYStep", 10.0)
        .with("tankRadius", 3.0)
        .with("tankInnerMat", "Void")
        .with("tankNLayer", 2_i64)
        .with("tankThick0", 0.5)
        .with("tankMat0", "Steel")
        .with("tankThick1", 0.5)
        .with("tankMat1", "Steel");
    p.add_material("Steel", 3);
    p.add_material("Concrete", 49);
    p
}

#[test]
fn slab_then_shell_writes_compressed_densities() {
    init_logging();
    let mut asm = Assembly::new();
    let origin = asm.add_root(WorldOrigin::new("origin"));
    let wall = asm.attach(LayeredSlab::new("wall"), origin, 0).unwrap();
    let tank = asm.attach(ShellStack::new("tank"), wall, 1).unwrap();

    let mut sim = Simulation::new();
    asm.build(&mut sim, &params()).unwrap();
    assert_eq!(sim.cell_count(), 6);

    let wall = asm.get(wall).unwrap().as_cell_map().unwrap();
    let tank = asm.get(tank).unwrap();
    assert_relative_eq!(*tank.frame().origin(), Point3::new(0.0, 14.0, 0.0), epsilon = 1e-12);
    let contained = tank.as_contained().unwrap();
    assert!(contained.is_inside(&Point3::new(0.0, 17.5, 0.0), &sim).unwrap());
    assert!(!contained.is_inside(&Point3::new(0.0, 2.0, 0.0), &sim).unwrap());
    let tank = tank.as_cell_map().unwrap();

    let mut density = CellValueSet::<1>::new("density", "RHO");
    let layers = wall.cells("layer").unwrap();
    density.set_values_for(layers[..2].iter().copied(), &[7.8]);
    density.set_values(layers[2], &[2.3]);
    density.set_values_for(tank.cells("shell").unwrap().iter().copied(), &[7.8]);

    let mut cells = wall.cell_map().all_cells();
    cells.extend(tank.cell_map().all_cells());
    let mut out = String::new();
    density.write_output(&mut out, &cells, "densities").unwrap();
    assert_eq!(
        out,
        "* densities\n\
         density RHO 20001-20002 7.800000\n\
         density RHO 20003 2.300000\n\
         density RHO 30002-30003 7.800000\n"
    );
}

#[test]
fn failed_component_stops_the_build() {
    init_logging();
    let mut p = params();
    p.remove("tankRadius");
    let mut asm = Assembly::new();
    let origin = asm.add_root(WorldOrigin::new("origin"));
    let wall = asm.attach(LayeredSlab::new("wall"), origin, 0).unwrap();
    asm.attach(ShellStack::new("tank"), wall, 1).unwrap();

    let mut sim = Simulation::new();
    let err = asm.build(&mut sim, &p).unwrap_err();
    assert!(err.to_string().contains("tankRadius"));
    assert_eq!(sim.cell_count(), 3);
    assert!(sim.range("tank").is_none());
}

#[test]
fn link_surface_feeds_a_dependent_front_cut() {
    init_logging();
    let p = params()
        .with("wallNLayer", 1_i64)
        .with("capWidth", 4.0)
        .with("capHeight", 4.0)
        .with("capNLayer", 1_i64)
        .with("capThick0", 1.0)
        .with("capMat0", "Concrete");
    let mut asm = Assembly::new();
    let origin = asm.add_root(WorldOrigin::new("origin"));
    let wall = asm.attach(LayeredSlab::new("wall"), origin, 0).unwrap();
    let mut sim = Simulation::new();
    asm.build(&mut sim, &p).unwrap();

    let cap = asm.attach(LayeredSlab::new("cap"), wall, 1).unwrap();
    let surface = asm.get(wall).unwrap().link(1).unwrap().surface.clone();
    assert_eq!(surface, Rule::Surf(20_011));
    asm.get_mut(cap)
        .unwrap()
        .as_external_cut_mut()
        .unwrap()
        .set_cut_surf("front", surface)
        .unwrap();
    asm.build(&mut sim, &p).unwrap();

    let cap = asm.get(cap).unwrap().as_cell_map().unwrap();
    let first = sim.cell(cap.cell("layer", 0).unwrap()).unwrap();
    assert_eq!(first.rule.to_string(), "30003 -30004 30005 -30006 20011 -30011");
    assert_eq!(first.material, 49);
}

#[test]
fn built_component_refuses_new_cuts() {
    init_logging();
    let mut asm = Assembly::new();
    let origin = asm.add_root(WorldOrigin::new("origin"));
    let wall = asm.attach(LayeredSlab::new("wall"), origin, 0).unwrap();
    let mut sim = Simulation::new();
    asm.build(&mut sim, &params()).unwrap();

    let built = asm.get_mut(wall).unwrap();
    let cut = built.as_external_cut_mut().unwrap();
    let err = cut.set_cut_surf("front", Rule::Surf(-20_001)).unwrap_err();
    assert!(err.to_string().contains("set_cut_surf"));
    let contained = built.as_contained_mut().unwrap();
    assert!(contained.add_boundary_cut(Rule::Surf(20_003)).is_err());
    assert!(contained.contained().boundary().is_none());

    let first = sim.cell(20_001).unwrap();
    assert_eq!(first.rule.to_string(), "20003 -20004 20005 -20006 20001 -20011");
}
