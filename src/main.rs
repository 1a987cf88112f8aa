mod app;
mod layout;
mod model;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{Expansion, Settings};
use layout::LayoutConfig;
use model::{Palette, default_display_keys};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Query result batches, merged in order.
    files: Vec<PathBuf>,

    /// Neighbour batch for a node, merged as collapsed elements.
    #[arg(long = "expand", value_name = "NODE_ID=FILE")]
    expansions: Vec<Expansion>,

    /// JSON file overriding any subset of the layout constants.
    #[arg(long, value_name = "FILE")]
    layout_config: Option<PathBuf>,

    /// Comma separated `#RRGGBB` colors for categories and relationships.
    #[arg(long)]
    palette: Option<String>,

    /// Stop each heat cycle after this many ticks.
    #[arg(long)]
    cooldown_ticks: Option<u32>,

    /// Property used for node captions, tried in order. Repeatable.
    #[arg(long = "display-key", value_name = "KEY")]
    display_keys: Vec<String>,

    #[arg(long, default_value = "graph")]
    graph_name: String,
}

impl Args {
    fn into_settings(self) -> Result<Settings> {
        let mut layout = match &self.layout_config {
            Some(path) => LayoutConfig::load(path)?,
            None => LayoutConfig::default(),
        };
        if self.cooldown_ticks.is_some() {
            layout.cooldown_ticks = self.cooldown_ticks;
        }

        let palette = match &self.palette {
            Some(raw) => Palette::parse_list(raw).context("invalid --palette")?,
            None => Palette::default(),
        };

        let display_keys = if self.display_keys.is_empty() {
            default_display_keys()
        } else {
            self.display_keys
        };

        Ok(Settings {
            files: self.files,
            expansions: self.expansions,
            layout,
            palette,
            display_keys,
            graph_name: self.graph_name,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graph_lens=info")),
        )
        .init();

    let settings = Args::parse().into_settings()?;
    info!(
        files = settings.files.len(),
        expansions = settings.expansions.len(),
        graph = %settings.graph_name,
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graph-lens",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer failed: {error}"))
}
