//! A guard agent driven by a behaviour tree.
//!
//! The guard patrols three posts until an enemy shows up, at which point a
//! higher-priority branch takes over: aim, then fire while the ammunition
//! lasts. Run with `RUST_LOG=trace` to watch every node tick.

use std::cell::RefCell;
use std::rc::Rc;

use salix_core::{Behavior, NodeError, Tree};
use salix_std::strategies::{ActionStrategy, ConditionStrategy, PatrolStrategy};
use tracing::info;

#[derive(Debug)]
struct World {
    position: f32,
    enemy_visible: bool,
    ammo: u32,
}

fn build_tree(seed: u64, world: &Rc<RefCell<World>>) -> Result<Tree, NodeError> {
    let mut tree = Tree::with_seed(seed);

    let brain = tree.add_node("brain", Behavior::priority_selector());
    tree.set_root(brain)?;

    // Engage branch, gated on actually seeing the enemy.
    let sees_enemy = {
        let world = world.clone();
        tree.add_node(
            "sees enemy",
            Behavior::leaf(ConditionStrategy::new(move || {
                world.borrow().enemy_visible
            })),
        )
    };
    let engage = tree.add_node("engage", Behavior::sequence_depend(sees_enemy));
    let aim = tree.add_node(
        "aim",
        Behavior::leaf(ActionStrategy::new(|| info!("taking aim"))),
    );
    let fire = {
        let world = world.clone();
        tree.add_node(
            "fire",
            Behavior::leaf(ConditionStrategy::new(move || {
                let mut world = world.borrow_mut();
                if world.ammo == 0 {
                    return false;
                }
                world.ammo -= 1;
                info!(ammo_left = world.ammo, "fired");
                true
            })),
        )
    };
    tree.add_child(engage, aim)?;
    tree.add_child(engage, fire)?;

    // Fallback: walk the posts forever.
    let patrol_loop = tree.add_node("patrol loop", Behavior::until_fail());
    let patrol = {
        let world = world.clone();
        PatrolStrategy::new(vec![0.0f32, 12.0, 24.0], move |target: &f32| {
            let mut world = world.borrow_mut();
            let delta = (*target - world.position).clamp(-3.0, 3.0);
            world.position += delta;
            (world.position - *target).abs() < f32::EPSILON
        })
    };
    let patrol_leaf = tree.add_node("patrol", Behavior::leaf(patrol));
    tree.add_child(patrol_loop, patrol_leaf)?;

    tree.add_child(brain, engage)?;
    tree.add_child(brain, patrol_loop)?;
    tree.set_priority(engage, 10)?;
    tree.set_priority(patrol_loop, 1)?;

    tree.initialize()?;
    Ok(tree)
}

fn flag_value(args: &[String], flag: &str) -> Option<u64> {
    let at = args.iter().position(|a| a == flag)?;
    args.get(at + 1)?.parse().ok()
}

fn main() -> Result<(), NodeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help") {
        eprintln!("./salix_demo [--ticks N] [--seed N]");
        std::process::exit(1);
    }
    let ticks = flag_value(&args, "--ticks").unwrap_or(60);
    let seed = flag_value(&args, "--seed").unwrap_or(1);

    let world = Rc::new(RefCell::new(World {
        position: 0.0,
        enemy_visible: false,
        ammo: 3,
    }));
    let mut tree = build_tree(seed, &world)?;

    for frame in 0..ticks {
        {
            let mut world = world.borrow_mut();
            // The enemy breaks cover for a handful of frames mid-run.
            world.enemy_visible = (30..36).contains(&frame);
        }
        let status = tree.tick()?;
        let position = world.borrow().position;
        info!(frame, ?status, position, "frame complete");
    }
    Ok(())
}
