//! `funrun record`: take payments, prompting for missing details.

use dialoguer::Select;
use serde::Serialize;
use strum::IntoEnumIterator;

use funrun_core::{College, CoreError, PaymentForm, PaymentRecord, PaymentRecorder, RecordOutcome};

use crate::cli::{PaymentArgs, RecordArgs};
use crate::config::Context;
use crate::error::{CliError, prompt_err};
use crate::output;

use super::util;

const DEFAULT_ACK: &str = "Payment recorded successfully";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recorded<'a> {
    #[serde(flatten)]
    record: &'a PaymentRecord,
    attempts: u32,
    confirmed: bool,
    message: &'a str,
}

pub async fn handle(args: RecordArgs, ctx: &Context) -> Result<(), CliError> {
    let staff = util::require_staff(ctx)?;
    let recorder = PaymentRecorder::connect(&ctx.recorder_config()?)?;
    let prompt = !args.no_input && util::interactive();

    let mut seed = args.payment;
    loop {
        let form = if prompt {
            prompt_form(&seed)?
        } else {
            form_from_args(&seed)
        };

        match recorder.record(&form, &staff).await {
            Ok(outcome) => {
                report(&outcome, ctx)?;
                seed = PaymentArgs::default();
            }
            // Let the staff member fix the entry instead of starting over
            Err(e @ (CoreError::Validation(_) | CoreError::RateLimitExceeded { .. })) if prompt => {
                output::print_status(&output::warning(&e.to_string(), ctx.color), false);
                seed = args_from_form(form);
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if !prompt || !util::confirm("Record another payment?", false)? {
            return Ok(());
        }
    }
}

fn report(outcome: &RecordOutcome, ctx: &Context) -> Result<(), CliError> {
    let record = &outcome.record;
    let message = outcome.receipt.message().unwrap_or(DEFAULT_ACK);

    output::print_status(
        &output::success(
            &format!("{message}: {} ({})", record.student_name, record.student_id),
            ctx.color,
        ),
        ctx.quiet,
    );

    let view = Recorded {
        record,
        attempts: outcome.receipt.attempts,
        confirmed: outcome.receipt.ack.confirmed,
        message,
    };
    let color = ctx.color;
    let rendered = output::render_single(
        ctx.output,
        &view,
        |v| {
            output::detail(
                &[
                    ("Student", v.record.student_name.clone()),
                    ("Student ID", v.record.student_id.clone()),
                    ("Email", v.record.email.clone()),
                    ("College", v.record.college.label().to_owned()),
                    ("Course", v.record.course.clone()),
                    (
                        "Amount",
                        format!("₱{} ({})", v.record.payment_amount, v.record.payment_method),
                    ),
                    ("Received by", v.record.received_by.clone()),
                    ("Submitted", v.record.submitted_at.clone()),
                    ("Attempts", v.attempts.to_string()),
                ],
                color,
            )
        },
        |v| v.record.student_id.clone(),
    )?;
    output::print_output(&rendered, ctx.quiet);
    Ok(())
}

// ── Form assembly ────────────────────────────────────────────────────

/// Flags only; anything missing stays empty and fails validation.
pub(super) fn form_from_args(args: &PaymentArgs) -> PaymentForm {
    PaymentForm {
        student_name: args.name.clone().unwrap_or_default(),
        student_id: args.student_id.clone().unwrap_or_default(),
        email: args.email.clone().unwrap_or_default(),
        college: args.college.clone().unwrap_or_default(),
        course: args.course.clone().unwrap_or_default(),
    }
}

fn args_from_form(form: PaymentForm) -> PaymentArgs {
    PaymentArgs {
        name: Some(form.student_name),
        student_id: Some(form.student_id),
        email: Some(form.email),
        college: Some(form.college),
        course: Some(form.course),
    }
}

/// Prompt for every field, pre-filled from `seed`.
fn prompt_form(seed: &PaymentArgs) -> Result<PaymentForm, CliError> {
    let text = |label: &str, value: Option<&str>| util::prompt_text(label, value.unwrap_or_default());

    Ok(PaymentForm {
        student_name: text("Student name", seed.name.as_deref())?,
        student_id: text("Student ID", seed.student_id.as_deref())?,
        email: text("Student email", seed.email.as_deref())?,
        college: prompt_college(seed.college.as_deref())?.to_string(),
        course: text("Course/program", seed.course.as_deref())?,
    })
}

fn prompt_college(current: Option<&str>) -> Result<College, CliError> {
    let colleges: Vec<College> = College::iter().collect();
    let labels: Vec<&str> = colleges.iter().copied().map(College::label).collect();
    let default = current
        .and_then(|code| {
            colleges
                .iter()
                .position(|c| c.to_string().eq_ignore_ascii_case(code.trim()))
        })
        .unwrap_or(0);

    let index = Select::new()
        .with_prompt("College")
        .items(&labels)
        .default(default)
        .interact()
        .map_err(prompt_err)?;
    Ok(colleges[index])
}
