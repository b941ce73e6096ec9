use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::store::StorySet;
use backlog_core::story::next_story_id;
use std::path::Path;

pub fn run(root: &Path, prefix: Option<&str>) -> anyhow::Result<i32> {
    let cfg = Config::load_or_default(root).context("failed to load config")?;
    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    let prefix = prefix.unwrap_or(&cfg.id_prefix);
    println!("{}", next_story_id(set.ids(), prefix));
    Ok(0)
}
