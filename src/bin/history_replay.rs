//! 历史操作脚本回放工具
//!
//! 用法: history_replay <script.json>

use std::path::PathBuf;

use annotation_history::replay::{run_script, ReplayScript};
use annotation_history::utils::init_logging;
use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    init_logging().map_err(anyhow::Error::msg)?;

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: history_replay <script.json>");
    };

    let script = ReplayScript::from_path(&path)
        .with_context(|| format!("failed to load script {}", path.display()))?;
    let report = run_script(&script).context("failed to replay script")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
