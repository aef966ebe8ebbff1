//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::CourseLibrary;
use anyhow::{bail, Result};
use std::path::Path;

/// Index a course file, or every course file in a folder.
pub async fn run_index(path: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = Settings::expand_path(path);
    let library = CourseLibrary::from_settings(&settings)?;

    if path.is_dir() {
        let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
        let result = library.add_course_folder(&path, clear).await;
        spinner.finish_and_clear();

        let (courses, chunks) = result?;
        Output::success(&format!("Indexed {} new courses ({} chunks)", courses, chunks));
    } else if path.is_file() {
        if clear {
            library.index().clear().await?;
            Output::info("Cleared existing course data.");
        }
        index_file(&library, &path).await?;
    } else {
        bail!("Path not found: {}", path.display());
    }

    let analytics = library.course_analytics().await?;
    Output::info(&format!("{} courses in the catalog", analytics.total_courses));

    Ok(())
}

async fn index_file(library: &CourseLibrary, path: &Path) -> Result<()> {
    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let result = library.add_course_document(path).await;
    spinner.finish_and_clear();

    let (course, chunks) = result?;
    Output::success(&format!("Indexed '{}'", course.title));
    Output::kv("Lessons", &course.lessons.len().to_string());
    Output::kv("Chunks", &chunks.to_string());
    Ok(())
}
