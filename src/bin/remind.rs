//! remind: command-line client for the voice-reminder service.
//!
//! Talks to the local reminder API to add, edit and delete reminders and to
//! show the upcoming and completed lists.

use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response, StatusCode};

use voice_reminder::api::{SimpleResponse, StatusResponse, TaskRequest};
use voice_reminder::reminder::task::{
    format_clock, format_day, format_interval, DEFAULT_REPEAT_INTERVAL, MAX_REPEAT_COUNT,
};
use voice_reminder::reminder::Task;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "remind", about = "Manage spoken reminders")]
struct Args {
    /// Port of the voice-reminder API
    #[arg(short, long, default_value_t = 8768)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Schedule a new reminder
    Add {
        /// What to remember
        text: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// Change an upcoming reminder
    Edit {
        id: String,
        text: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// Delete a reminder
    Rm {
        id: String,
        /// Delete from the completed list instead of upcoming
        #[arg(long)]
        completed: bool,
    },
    /// Show upcoming reminders
    List,
    /// Show completed reminders
    Completed,
    /// Show service status
    Status,
}

#[derive(clap::Args, Debug)]
struct ScheduleArgs {
    /// Time of day, 24-hour HH:MM
    #[arg(long = "at")]
    time: String,

    /// How many times to speak the reminder (1 = no repeat)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_REPEAT_COUNT as i64))]
    repeat: u32,

    /// Seconds between repeats: 5, 10, 30, 60, 300, 600 or 900
    #[arg(long, default_value_t = DEFAULT_REPEAT_INTERVAL)]
    every: u64,
}

impl ScheduleArgs {
    fn into_request(self, text: String) -> TaskRequest {
        TaskRequest {
            text,
            time: self.time,
            repeat_count: self.repeat,
            repeat_interval: self.every,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> CliResult<()> {
    let args = Args::parse();
    let base = format!("http://127.0.0.1:{}", args.port);

    let client = Client::builder()
        .connect_timeout(Duration::from_millis(500))
        .timeout(Duration::from_secs(5))
        .build()?;

    match args.command {
        Command::Add { text, schedule } => {
            let resp = client
                .post(format!("{base}/tasks"))
                .json(&schedule.into_request(text))
                .send()
                .await?;
            let task: Task = check(resp).await?.json().await?;
            println!("Reminder set for {}", describe_when(&task));
            println!("  id: {}", task.id);
        }
        Command::Edit { id, text, schedule } => {
            let resp = client
                .put(format!("{base}/tasks/{id}"))
                .json(&schedule.into_request(text))
                .send()
                .await?;
            let task: Task = check(resp).await?.json().await?;
            println!("Reminder updated: {}", describe_when(&task));
        }
        Command::Rm { id, completed } => {
            let path = if completed { "tasks/completed" } else { "tasks" };
            let resp = client.delete(format!("{base}/{path}/{id}")).send().await?;
            check(resp).await?;
            println!("Deleted {id}");
        }
        Command::List => {
            let resp = client.get(format!("{base}/tasks")).send().await?;
            let tasks: Vec<Task> = check(resp).await?.json().await?;
            print_upcoming(&tasks);
        }
        Command::Completed => {
            let resp = client.get(format!("{base}/tasks/completed")).send().await?;
            let tasks: Vec<Task> = check(resp).await?.json().await?;
            print_completed(&tasks);
        }
        Command::Status => {
            let resp = client.get(format!("{base}/status")).send().await?;
            let status: StatusResponse = check(resp).await?.json().await?;
            println!(
                "{} upcoming, {} completed{}",
                status.pending,
                status.completed,
                if status.speaking { ", speaking now" } else { "" }
            );
        }
    }

    Ok(())
}

/// Turn an API error body into an error message.
async fn check(resp: Response) -> CliResult<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let body = resp.json::<SimpleResponse>().await.ok();
    Err(error_message(status, body).into())
}

fn error_message(status: StatusCode, body: Option<SimpleResponse>) -> String {
    let message = match body {
        Some(body) => body.error.unwrap_or(body.status),
        None => status.canonical_reason().unwrap_or("request failed").to_string(),
    };

    match status {
        StatusCode::CONFLICT => format!("{message}. Please choose a different time."),
        _ => message,
    }
}

fn describe_when(task: &Task) -> String {
    format!(
        "{} {}",
        format_clock(task.time),
        format_day(task.time, Local::now())
    )
}

fn print_upcoming(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No upcoming reminders.");
        return;
    }

    for (i, task) in tasks.iter().enumerate() {
        println!("{:>2}. {}", i + 1, task.text);
        let repeats = if task.total_repeats > 1 {
            format!(
                " · {} of {} left, every {}",
                task.repeats_left,
                task.total_repeats,
                format_interval(task.repeat_interval)
            )
        } else {
            String::new()
        };
        println!("    {}{repeats}", describe_when(task));
        println!("    id: {}", task.id);
    }
}

fn print_completed(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No completed reminders.");
        return;
    }

    for task in tasks {
        let repeated = if task.total_repeats > 1 {
            format!(" (spoken {} times)", task.total_repeats)
        } else {
            String::new()
        };
        println!("  ✓ {} · {}{repeated}", task.text, describe_when(task));
        println!("    id: {}", task.id);
    }
}
