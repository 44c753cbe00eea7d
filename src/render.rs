//! Colored terminal rendering of a sync plan.

use lnsync_core::config::SyncOptions;
use lnsync_core::event::DestinationEvent;
use lnsync_core::reconcile::{PendingCreate, SyncPlan};
use lnsync_core::render as event_render;
use owo_colors::OwoColorize;

/// Show every change up to this many, then only counts
const COMPACT_THRESHOLD: usize = 20;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for PendingCreate {
    fn render(&self) -> String {
        let start = self.entry.start_time().to_string();
        format!(
            "{} {} {} {}",
            "+".green(),
            self.entry.subject.green(),
            start.dimmed(),
            format!("({})", self.entry.kind).dimmed()
        )
    }
}

impl Render for DestinationEvent {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            "-".red(),
            self.summary.red(),
            self.start.to_string().dimmed()
        )
    }
}

pub fn render_plan(plan: &SyncPlan, options: &SyncOptions, verbose: bool) -> String {
    let mut lines = Vec::new();

    if plan.is_empty() {
        lines.push("   Destination is up to date".dimmed().to_string());
    } else if verbose || plan.to_create.len() + plan.to_delete.len() <= COMPACT_THRESHOLD {
        for event in &plan.to_delete {
            lines.push(format!("   {}", event.render()));
        }
        for pending in &plan.to_create {
            lines.push(format!("   {}", pending.render()));
            if options.subject_override.is_some() {
                let shown = event_render::subject(&pending.entry, options);
                lines.push(format!("      {}", format!("shown as \"{}\"", shown).dimmed()));
            }
        }
    } else {
        if !plan.to_delete.is_empty() {
            let label = format!("({} to delete)", plan.to_delete.len());
            lines.push(format!("   {} {}", "-".red(), label.red()));
        }
        if !plan.to_create.is_empty() {
            let label = format!("({} to create)", plan.to_create.len());
            lines.push(format!("   {} {}", "+".green(), label.green()));
        }
    }

    let mut summary = format!("{} unchanged", plan.unchanged);
    if plan.foreign > 0 {
        summary.push_str(&format!(", {} not managed by lnsync", plan.foreign));
    }
    if !plan.rejected.is_empty() {
        summary.push_str(&format!(", {} skipped", plan.rejected.len()));
    }
    lines.push(format!("   {}", summary.dimmed()));

    for error in &plan.rejected {
        lines.push(format!("   {} {}", "!".yellow(), error.to_string().yellow()));
    }

    lines.join("\n")
}
