//=========================================================================
// Forge Demo
//
// Opens a game window through the native engine and reports key presses
// until the window is closed.
//
// Usage:
//   forge_demo [LIBRARY_PATH]
//
// Without an argument the library is taken from `$FORGE_ENGINE_LIB` or
// the platform default name.
//
//=========================================================================

use std::process::ExitCode;

use forge_game::logging::{init_logging, LoggingConfig};
use forge_game::{EventType, GameBuilder};
use log::{error, info};

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let mut builder = GameBuilder::new().with_title("ForgeGame");
    if let Some(path) = std::env::args_os().nth(1) {
        builder = builder.with_library(path);
    }

    match run(builder) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(builder: GameBuilder) -> forge_game::Result<()> {
    let game = builder.build()?;

    game.input_system()?.subscribe(|event| match event {
        EventType::KeyPressed => info!("Key pressed"),
        EventType::Closed => info!("Window closed"),
        _ => {}
    });

    game.run()?;
    game.dispose();
    Ok(())
}
