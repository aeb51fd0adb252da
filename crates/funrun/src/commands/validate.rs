//! `funrun validate`: run the recorder's checks without sending anything.

use funrun_core::{CoreError, PaymentRecorder};

use crate::cli::PaymentArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{record, util};

pub fn handle(args: &PaymentArgs, ctx: &Context) -> Result<(), CliError> {
    let staff = util::require_staff(ctx)?;
    let recorder = PaymentRecorder::connect(&ctx.recorder_config()?)?;

    let form = record::form_from_args(args);
    let record = recorder
        .prepare(&form, &staff)
        .map_err(CoreError::Validation)?;

    output::print_status(
        &output::success("Payment details are valid (nothing was sent)", ctx.color),
        ctx.quiet,
    );
    let color = ctx.color;
    let rendered = output::render_single(
        ctx.output,
        &record,
        |r| {
            output::detail(
                &[
                    ("Student", r.student_name.clone()),
                    ("Student ID", r.student_id.clone()),
                    ("Email", r.email.clone()),
                    ("College", r.college.to_string()),
                    ("Course", r.course.clone()),
                    ("Amount", format!("₱{} ({})", r.payment_amount, r.payment_method)),
                    ("Received by", r.received_by.clone()),
                ],
                color,
            )
        },
        |r| r.student_id.clone(),
    )?;
    output::print_output(&rendered, ctx.quiet);
    Ok(())
}
