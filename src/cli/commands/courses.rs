//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::CourseLibrary;
use anyhow::Result;

/// List the indexed courses.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Courses, &settings)?;

    let library = CourseLibrary::from_settings(&settings)?;

    let analytics = library.course_analytics().await?;

    if analytics.total_courses == 0 {
        Output::info("No courses indexed yet.");
        Output::info("Index course files with: pensum index <path>");
        return Ok(());
    }

    Output::header(&format!("Courses ({})", analytics.total_courses));
    for title in &analytics.course_titles {
        Output::list_item(title);
    }

    Ok(())
}
