//! Duel demo
//!
//! Plays two scripted players against each other over a simulated network
//! link with rollback, then checks that both peers ended in the same state.
//!
//! Usage: `duel [config.ron|config.toml]`

mod config;
mod contacts;
mod game;
mod session;

use rollback_engine::config::Config;

use config::DuelConfig;
use session::LoopbackSession;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => DuelConfig::load_from_file(&path)?,
        None => DuelConfig::default(),
    };
    config.validate()?;

    rollback_engine::foundation::logging::init_with_level(&config.engine.logging.level);
    log::info!("Starting duel with seed {:#x}", config.session.seed);

    let report = LoopbackSession::new(&config)?.run()?;

    log::info!(
        "Played {} frames: {} + {} rollbacks, {} checksums matched, score {}:{}",
        report.frames,
        report.rollbacks[0],
        report.rollbacks[1],
        report.checksum_matches,
        report.scores[0],
        report.scores[1]
    );

    if !report.is_consistent() {
        log::error!("Peers diverged: {:?}", report);
        return Err(format!("{} desynced frames", report.desyncs).into());
    }
    log::info!("Final checksum {:08x}", report.confirmed_checksums[0]);
    Ok(())
}
