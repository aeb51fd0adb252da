//! `funrun stats`: payments recorded by the signed-in staff member.

use tabled::Tabled;

use funrun_core::{StatsReader, StatsReport};

use crate::cli::StatsArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    period: &'static str,
    #[tabled(rename = "Payments")]
    payments: u64,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn peso(amount: f64) -> String {
    format!("₱{amount:.2}")
}

fn rows(report: &StatsReport) -> [PeriodRow; 3] {
    let stats = &report.stats;
    [
        PeriodRow {
            period: "Today",
            payments: stats.today_payments,
            amount: peso(stats.today_amount),
        },
        PeriodRow {
            period: "Previous",
            payments: report.previous_payments(),
            amount: peso(report.previous_amount()),
        },
        PeriodRow {
            period: "Total",
            payments: stats.total_payments,
            amount: peso(stats.total_amount),
        },
    ]
}

fn detail(report: &StatsReport, color: bool) -> String {
    let heading = output::dim(
        &format!("{} on {}", report.receiver_email, report.date),
        color,
    );
    format!("{heading}\n{}", output::render_table(&rows(report)))
}

pub async fn handle(args: &StatsArgs, ctx: &Context) -> Result<(), CliError> {
    let staff = util::require_staff(ctx)?;
    let reader = StatsReader::connect(&ctx.recorder_config()?)?;
    let report = reader.daily(&staff, args.date.as_deref()).await?;

    let color = ctx.color;
    let rendered = output::render_single(
        ctx.output,
        &report,
        |r| detail(r, color),
        |r| r.stats.today_payments.to_string(),
    )?;
    output::print_output(&rendered, ctx.quiet);
    Ok(())
}
