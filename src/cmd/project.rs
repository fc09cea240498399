//! Project initialization command.

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use autodoc::init::init_project;

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "Initialized autodoc project at {}",
            result.autodoc_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .autodoc/");
        println!("  ├── autodoc.toml  # Project configuration");
        println!("  └── cache/        # Intermediate artifacts of a run");
        println!();
        println!("Next steps:");
        println!("  1. Describe the project under [project.additional_info] in autodoc.toml");
        println!("  2. Put API_KEY=... in .env or export it");
        println!("  3. Run `autodoc run` to generate documentation");
    } else if result.config_written {
        println!(
            "Wrote default autodoc.toml to {}",
            result.autodoc_dir.display()
        );
    } else {
        println!(
            "Autodoc project already initialized at {}",
            result.autodoc_dir.display()
        );
        println!("Directory structure verified.");
    }

    Ok(())
}
