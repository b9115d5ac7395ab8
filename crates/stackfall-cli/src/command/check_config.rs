use std::path::PathBuf;

use serde::Serialize;
use stackfall_engine::{GameSettings, PieceRegistry};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CheckConfigArg {
    /// Configuration file (the built-in configuration when omitted)
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSummary<'a> {
    grid_width: usize,
    grid_height: usize,
    settings: &'a GameSettings,
    pieces: Vec<PieceSummary<'a>>,
    has_texts: bool,
    has_assets: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PieceSummary<'a> {
    id: u8,
    name: &'a str,
    rotations: usize,
    spawn_offset: (i32, i32),
    /// Bounding box (width, height) of every rotation state.
    shape_sizes: Vec<(usize, usize)>,
}

pub(crate) fn run(arg: &CheckConfigArg) -> anyhow::Result<()> {
    let CheckConfigArg { config } = arg;
    let config = util::load_config(config.as_deref())?;
    let registry = PieceRegistry::from_config(&config)?;

    let pieces = registry
        .iter()
        .map(|def| PieceSummary {
            id: def.id().get(),
            name: def.name(),
            rotations: def.rotation_count(),
            spawn_offset: def.spawn_offset(),
            shape_sizes: (0..def.rotation_count())
                .map(|rotation| {
                    let shape = def.shape(rotation);
                    (shape.width(), shape.height())
                })
                .collect(),
        })
        .collect();
    let summary = ConfigSummary {
        grid_width: config.game_settings.grid_width,
        grid_height: config.game_settings.grid_height,
        settings: &config.game_settings,
        pieces,
        has_texts: !config.texts.is_null(),
        has_assets: !config.assets.is_null(),
    };

    eprintln!("Configuration OK: {} piece kinds", registry.len());
    Output::save_json(&summary, None)?;
    Ok(())
}
