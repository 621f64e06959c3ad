use std::{
    env,
    io::{self, Write},
    path::PathBuf,
    process::{Command, Stdio},
};

use anyhow::Context;
use chrono::NaiveDate;

use fixer_schedule::{
    calendar::{Party, Viewer, YearMonth},
    scheduling::{SlotClock, SlotGenerator, reconcile},
    storage::config::Config,
    sync::{AppointmentApi, AppointmentClient},
    ui::{
        day_list::{self, DayList, DayListEntry},
        theme::Theme,
    },
};

pub const USAGE: &str =
    "Usage: fixer-schedule [--config PATH] [--fixer ID] [--requester ID | --as-fixer] [--agenda [YYYY/MM/DD]]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Agenda(Option<NaiveDate>),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
    pub fixer_id: Option<String>,
    pub requester_id: Option<String>,
    pub as_fixer: bool,
}

impl CliOptions {
    pub fn apply(&self, config: &mut Config) {
        if let Some(fixer_id) = &self.fixer_id {
            config.identity.fixer_id = fixer_id.clone();
        }
        if let Some(requester_id) = &self.requester_id {
            config.identity.requester_id = Some(requester_id.clone());
            config.identity.role = Party::Requester;
        }
        if self.as_fixer {
            config.identity.role = Party::Fixer;
        }
    }

    pub fn load_config(&self) -> Result<Config, fixer_schedule::storage::config::ConfigError> {
        let mut config = match &self.config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load_or_create()?,
        };
        self.apply(&mut config);
        Ok(config)
    }
}

pub fn parse_cli_mode() -> Result<(CliMode, CliOptions), String> {
    parse_args(env::args().skip(1))
}

pub fn parse_args<I>(args: I) -> Result<(CliMode, CliOptions), String>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Interactive;
    let mut options = CliOptions::default();
    let mut args = args.into_iter().peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--agenda" => {
                let date = match args.next_if(|next| !next.starts_with("--")) {
                    Some(date_str) => Some(
                        NaiveDate::parse_from_str(&date_str, "%Y/%m/%d")
                            .map_err(|_| format!("Invalid date '{}'. Use YYYY/MM/DD.", date_str))?,
                    ),
                    None => None,
                };
                mode = CliMode::Agenda(date);
            }
            "--fixer" => options.fixer_id = Some(value_for(&arg, args.next())?),
            "--requester" => options.requester_id = Some(value_for(&arg, args.next())?),
            "--as-fixer" => options.as_fixer = true,
            "--config" => options.config_path = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--help" | "-h" => mode = CliMode::Help,
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    if options.as_fixer && options.requester_id.is_some() {
        return Err("--as-fixer and --requester cannot be combined".to_string());
    }
    Ok((mode, options))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value
        .filter(|v| !v.starts_with("--") && !v.trim().is_empty())
        .ok_or_else(|| format!("{} needs a value", flag))
}

pub async fn run_agenda_mode(config: &Config, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let policy = config.business_policy()?;
    let viewer = config.viewer()?;
    let clock = SlotClock::system(policy.clone());
    let date = date.unwrap_or_else(|| clock.today());
    let api = AppointmentClient::new(config.backend.base_url.clone(), policy).with_timeout(config.request_timeout());
    let list = agenda_for(&api, &clock, config.identity.fixer_id.trim(), &viewer, date).await?;

    display_with_pager(&format_agenda_text(&list, &viewer))?;
    Ok(())
}

pub async fn agenda_for(
    api: &dyn AppointmentApi,
    clock: &SlotClock,
    fixer_id: &str,
    viewer: &Viewer,
    date: NaiveDate,
) -> anyhow::Result<DayList> {
    if fixer_id.is_empty() {
        anyhow::bail!(
            "No fixer configured. Set identity.fixer_id in {} or pass --fixer",
            Config::config_path().display()
        );
    }

    let records = api
        .fetch_schedules(fixer_id, YearMonth::containing(date))
        .await
        .inspect_err(|e| tracing::error!("Agenda fetch for {} failed: {}", date, e))
        .context("Failed to fetch schedules")?;

    let generator = SlotGenerator::new(clock.clone());
    let slots = reconcile(generator.generate_day(date, fixer_id), &records, viewer);
    Ok(day_list::calculate_layout(&slots, date, None, clock.today()))
}

pub fn format_agenda_text(list: &DayList, viewer: &Viewer) -> String {
    let theme = Theme::default();
    let mut lines = Vec::new();
    lines.push(format!("Agenda - {}", list.date.format("%A, %B %d, %Y")));
    lines.push(String::new());

    if list.entries.is_empty() {
        lines.push("No slots for this day.".to_string());
    }
    for entry in &list.entries {
        let label = match entry {
            DayListEntry::Slot(row) => theme.slot_style(row.state, viewer).label,
            DayListEntry::Closed { .. } => "NO DISPONIBLE",
        };
        lines.push(format!("- {:<13}  {}", entry.time_label(), label));
    }

    lines.join("\n")
}

fn display_with_pager(text: &str) -> Result<(), io::Error> {
    let pager_value = env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut parts = pager_value.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c,
        None => {
            println!("{text}");
            return Ok(());
        }
    };
    let args: Vec<&str> = parts.collect();

    match Command::new(cmd)
        .args(&args)
        .stdin(Stdio::piped())
        .spawn()
    {
        Ok(mut child) => {
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(text.as_bytes())?;
            }
            drop(child.stdin.take());
            let _ = child.wait();
        }
        Err(_) => {
            println!("{text}");
        }
    }

    Ok(())
}
