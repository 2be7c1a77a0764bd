//! Arcade Physics headless demo
//!
//! Runs a block layout with an auto-tracking paddle and one ball, knocking
//! out blocks as they are hit. Pass a JSON world config path to override the
//! defaults; set `RUST_LOG=debug` for more detail.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use arcade_physics::consts::*;
    use arcade_physics::sim::{ColliderKind, MovingBody, Obstacle, PhysicsWorld, Rect, SpatialIndex};
    use arcade_physics::{BodyConfig, Vector2, WorldConfig};

    const DEMO_SEED: u64 = 0x5eed;
    const MAX_TICKS: u32 = 120 * 120;
    const BALL_ID: u32 = 1;
    const PADDLE_ID: u32 = 0;
    const PADDLE_WIDTH: f64 = 100.0;
    const PADDLE_HEIGHT: f64 = 12.0;
    /// Paddle tracking speed (units/s)
    const PADDLE_SPEED: f64 = 420.0;
    const BLOCK_COLS: u32 = 10;
    const BLOCK_ROWS: u32 = 5;

    /// Load config from the first CLI argument, if any
    pub fn load_config() -> WorldConfig {
        let Some(path) = std::env::args().nth(1) else {
            return WorldConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => WorldConfig::load_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {} ({}), using defaults", path, e);
                WorldConfig::default()
            }
        }
    }

    /// Rows of static blocks across the top of the field
    fn layout_blocks(config: &WorldConfig) -> Vec<Obstacle> {
        let margin = config.field_width * 0.05;
        let slot = (config.field_width - 2.0 * margin) / BLOCK_COLS as f64;
        let height = config.cell_size * 0.4;

        (0..BLOCK_ROWS)
            .flat_map(|row| (0..BLOCK_COLS).map(move |col| (row, col)))
            .map(|(row, col)| {
                let rect = Rect::new(
                    margin + col as f64 * slot + 2.0,
                    config.field_height * 0.1 + row as f64 * (height + 4.0),
                    slot - 4.0,
                    height,
                );
                Obstacle::wall(100 + row * BLOCK_COLS + col, rect)
            })
            .collect()
    }

    pub fn run(config: WorldConfig) {
        let mut rng = Pcg32::seed_from_u64(DEMO_SEED);
        let mut world = PhysicsWorld::new(config.clone());
        let config = world.config().clone();
        let mut index = SpatialIndex::for_config(&config);

        let mut blocks = layout_blocks(&config);
        for block in &blocks {
            index.insert(block.id, block.rect);
        }
        log::info!("Placed {} blocks ({:?})", blocks.len(), index.stats());

        let ball_config = BodyConfig::at(Vector2::new(
            config.field_width / 2.0,
            config.field_height * 0.8,
        ));
        world.add_body(MovingBody::new(BALL_ID, &ball_config, &mut rng));

        let paddle_y = config.field_height - 40.0;
        let mut paddle_x = (config.field_width - PADDLE_WIDTH) / 2.0;
        let mut destroyed = 0u32;
        let mut paddle_hits = 0u32;
        let mut lost = 0u32;
        let mut ticks = 0u32;

        while ticks < MAX_TICKS && !blocks.is_empty() {
            ticks += 1;

            // Paddle chases the ball with a speed limit
            if let Some(ball) = world.body(BALL_ID) {
                let target = ball.position.x - PADDLE_WIDTH / 2.0;
                let max_step = PADDLE_SPEED * SIM_DT;
                paddle_x += (target - paddle_x).clamp(-max_step, max_step);
                paddle_x = paddle_x.clamp(0.0, config.field_width - PADDLE_WIDTH);
            }

            let mut obstacles = blocks.clone();
            obstacles.push(Obstacle::paddle(
                PADDLE_ID,
                Rect::new(paddle_x, paddle_y, PADDLE_WIDTH, PADDLE_HEIGHT),
            ));

            for event in world.step_indexed(SIM_DT, &index, &obstacles) {
                match (event.kind, event.obstacle_id()) {
                    (ColliderKind::Paddle, _) => paddle_hits += 1,
                    (ColliderKind::Wall, Some(id)) => {
                        if index.remove(id) {
                            blocks.retain(|b| b.id != id);
                            destroyed += 1;
                            log::debug!("tick {}: block {} destroyed", ticks, id);
                        }
                    }
                    _ => {}
                }
            }

            let out = world
                .body(BALL_ID)
                .is_some_and(|ball| world.is_out_of_bounds(ball));
            if out {
                lost += 1;
                log::info!("tick {}: ball lost, serving again", ticks);
                if let Some(ball) = world.body_mut(BALL_ID) {
                    ball.reset(&ball_config, &mut rng);
                }
            }
        }

        log::info!("Final grid: {:?}", index.stats());
        println!(
            "{} ticks: {} blocks destroyed, {} remaining, {} paddle hits, {} balls lost",
            ticks,
            destroyed,
            blocks.len(),
            paddle_hits,
            lost
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Arcade Physics (native) starting...");
    demo::run(demo::load_config());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on the web; the game drives PhysicsWorld directly
}
