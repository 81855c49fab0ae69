//! `coursework` - drive lesson progression against the course backend.

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use course_core::model::{Course, CourseId};
use course_core::progress::{NextAction, Task};
use services::{AppServices, CatalogService, Clock, CompletionOutcome, Dashboard, SessionConfig};
use storage::http::BackendConfig;
use storage::repository::Storage;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "coursework")]
#[command(about = "Follow courses lesson by lesson: watch, submit, and track progress", long_about = None)]
struct Cli {
    /// Backend base URL (overrides COURSEWORK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the course catalog
    Courses,
    /// Show a course and its lessons
    Course { id: CourseId },
    /// Show your enrollments and their progress
    Dashboard,
    /// Show the next task to do in a course
    Next { course: CourseId },
    /// Mark a lesson video as watched (lessons are numbered from 0)
    Watch { course: CourseId, lesson: usize },
    /// Submit a lesson assignment (a link or a text answer)
    Assignment {
        course: CourseId,
        lesson: usize,
        content: String,
    },
    /// Submit a lesson quiz score
    Quiz {
        course: CourseId,
        lesson: usize,
        #[arg(long)]
        score: u32,
        #[arg(long)]
        total: u32,
    },
    /// Mark every task of a course as done
    CompleteAll { course: CourseId },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = BackendConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }

    // Dropping the command future abandons any in-flight request; nothing is
    // committed locally before the backend acknowledges a write.
    tokio::select! {
        result = run(cli.command, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, pending request abandoned");
            Err(anyhow!("interrupted"))
        }
    }
}

async fn run(command: Command, config: &BackendConfig) -> Result<()> {
    match command {
        Command::Courses => {
            let catalog = CatalogService::new(Storage::http(config)?.courses);
            let courses = catalog.list_courses().await?;
            println!("Courses ({})", courses.len());
            for course in courses {
                println!(
                    "  {} | {} | {} lessons",
                    course.id(),
                    course.title(),
                    course.lesson_count()
                );
            }
        }
        Command::Course { id } => {
            let catalog = CatalogService::new(Storage::http(config)?.courses);
            let Some(course) = catalog.get_course(&id).await? else {
                bail!("course {id} not found");
            };
            print_course(&course);
        }
        Command::Dashboard => {
            let dashboard = signed_in(config)?.dashboard().load().await?;
            print_dashboard(&dashboard);
        }
        Command::Next { course } => {
            let next = signed_in(config)?.progress().next_action(&course).await?;
            print_next(&next);
        }
        Command::Watch { course, lesson } => {
            let outcome = signed_in(config)?
                .progress()
                .record_for_course(&course, lesson, Task::Video)
                .await?;
            print_outcome(&outcome);
        }
        Command::Assignment {
            course,
            lesson,
            content,
        } => {
            let outcome = signed_in(config)?
                .submissions()
                .submit_assignment(&course, lesson, &content)
                .await?;
            print_outcome(&outcome);
        }
        Command::Quiz {
            course,
            lesson,
            score,
            total,
        } => {
            let outcome = signed_in(config)?
                .submissions()
                .submit_quiz_score(&course, lesson, score, total)
                .await?;
            println!("Quiz submitted: {score}/{total}");
            print_outcome(&outcome);
        }
        Command::CompleteAll { course } => {
            let enrollment = signed_in(config)?
                .progress()
                .force_complete_all(&course)
                .await?;
            println!("Course {course} marked complete ({}%)", enrollment.progress());
        }
    }
    Ok(())
}

/// Services for the student or admin named by the `COURSEWORK_*` session variables.
fn signed_in(config: &BackendConfig) -> Result<AppServices> {
    let session = SessionConfig::from_env()?.into_session();
    Ok(AppServices::http(config, session, Clock::default())?)
}

fn print_course(course: &Course) {
    println!("Course: {}", course.title());
    if let Some(instructor) = course.instructor() {
        println!("  Instructor: {instructor}");
    }
    if let Some(description) = course.description() {
        println!("  {description}");
    }
    for lesson in course.lessons() {
        match lesson.video() {
            Some(video) => println!("  [{}] {} ({video})", lesson.index(), lesson.title()),
            None => println!("  [{}] {}", lesson.index(), lesson.title()),
        }
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!(
        "Enrolled in {} courses, {} completed, average progress {}%",
        dashboard.items.len(),
        dashboard.completed_count(),
        dashboard.average_progress
    );
    for item in &dashboard.items {
        let tally = item.tally;
        println!(
            "  {} | {}% | watch {}/{} assignment {}/{} quiz {}/{}",
            item.course.title(),
            item.enrollment.progress(),
            tally.video,
            tally.lessons,
            tally.assignment,
            tally.lessons,
            tally.quiz,
            tally.lessons,
        );
    }
}

fn print_next(next: &NextAction) {
    match next {
        NextAction::Perform { lesson, task } => {
            println!("Next: {task} (lesson {lesson})");
        }
        NextAction::Done => println!("All lessons complete"),
    }
}

fn print_outcome(outcome: &CompletionOutcome) {
    match outcome {
        CompletionOutcome::Recorded(enrollment) => {
            println!("Recorded, progress {}%", enrollment.progress());
        }
        CompletionOutcome::AlreadyCompleted(enrollment) => {
            println!("Already completed, progress {}%", enrollment.progress());
        }
    }
}
