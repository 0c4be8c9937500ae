use anyhow::Result;

use crate::config::Config;
use crate::template::TemplateSource;

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = Config::load_with_path(config_path)?;
    let store = config.template_store();

    println!("\nAvailable templates:\n");
    for info in store.list() {
        let source = match &info.source {
            TemplateSource::Builtin => "built-in".to_string(),
            TemplateSource::Directory(dir) => dir.display().to_string(),
        };
        println!("  {:<24} {:>3} file(s)  {}", info.id, info.files, source);
    }
    if store.dirs().is_empty() {
        println!("\nNo user template directories configured ([templates] dirs).");
    }
    Ok(())
}
