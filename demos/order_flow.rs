//! Pizza order conversation
//!
//! Runs a scripted conversation through `DialogTurnHandler`: a waterfall asks
//! for a name and a quantity with prompts, then confirms the order. The stack
//! is persisted in memory between turns, exactly as a host would persist it.
//!
//! Run with: `cargo run --example order_flow`

use cim_dialog_stack::{
    Activity, DialogCatalog, DialogResult, DialogStateRepository, DialogTurnHandler,
    InMemoryDialogStateRepository, InMemoryTurnContext, Prompt, PromptOptions,
    TracingTelemetryClient, TurnOutcome, WaterfallDialog, WaterfallStepContext,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn ask_name(step: &mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome> {
    let options = PromptOptions::new()
        .with_prompt(Activity::text("Welcome! Who is this order for?"))
        .to_value()?;
    step.begin_dialog("name", Some(options))
}

fn ask_quantity(step: &mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome> {
    let name = step.result().cloned().unwrap_or(Value::Null);
    step.set_value("name", name);
    let options = PromptOptions::new()
        .with_prompt(Activity::text("How many pizzas?"))
        .with_retry_prompt(Activity::text("Please enter a whole number between 1 and 20."))
        .with_validations(json!({ "min": 1, "max": 20 }))
        .to_value()?;
    step.begin_dialog("quantity", Some(options))
}

fn confirm(step: &mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome> {
    let order = json!({
        "name": step.value("name").cloned(),
        "quantity": step.result().cloned(),
    });
    Ok(step.end_dialog(Some(order)))
}

fn build_catalog() -> DialogResult<DialogCatalog> {
    let mut catalog = DialogCatalog::with_telemetry(Arc::new(TracingTelemetryClient));
    catalog
        .register(
            WaterfallDialog::new("order")
                .step(ask_name)
                .step(ask_quantity)
                .step(confirm),
        )?
        .register(Prompt::text("name"))?
        .register(Prompt::number("quantity").with_validator(|ctx| {
            let bounds = ctx.options().validations.clone().unwrap_or(Value::Null);
            let min = bounds.get("min").and_then(Value::as_f64).unwrap_or(f64::MIN);
            let max = bounds.get("max").and_then(Value::as_f64).unwrap_or(f64::MAX);
            ctx.recognized()
                .value
                .is_some_and(|n| n.fract() == 0.0 && (min..=max).contains(&n))
        }))?;
    Ok(catalog)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let repository = Arc::new(InMemoryDialogStateRepository::new());
    let handler = DialogTurnHandler::new(repository.clone(), Arc::new(build_catalog()?), "order")?;

    let conversation = "demo-conversation";
    for text in ["hi", "Ada", "lots", "0", "3"] {
        println!("user> {text}");
        let turn = InMemoryTurnContext::from_text(text);
        let outcome = handler.handle_turn(conversation, &turn).await?;
        for reply in turn.sent_text().await {
            println!("bot>  {reply}");
        }
        if let TurnOutcome::Completed(Some(order)) = outcome {
            println!("order placed: {order}");
        }
    }

    let state = repository.load(conversation).await?;
    println!("dialogs left on the stack: {}", state.depth());
    Ok(())
}
