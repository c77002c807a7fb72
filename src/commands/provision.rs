// ABOUTME: Provision command implementation.
// ABOUTME: Runs the orchestrator while streaming its step updates to the terminal.

use sitesmith::config::Config;
use sitesmith::error::Result;
use sitesmith::output::Output;
use sitesmith::provision::ProvisioningOrchestrator;
use sitesmith::request::ProvisioningRequest;
use sitesmith::steps::StepTracker;
use sitesmith::types::JobId;
use std::path::Path;
use std::sync::Arc;

pub async fn provision(config: Config, request_path: &Path, mut output: Output) -> Result<()> {
    let request = ProvisioningRequest::load(request_path)?;
    let tracker = Arc::new(StepTracker::new());
    let orchestrator = ProvisioningOrchestrator::from_config(&config, tracker.clone())?;

    output.start_timer();
    output.progress(&format!(
        "Provisioning {}.{} for {}",
        request.subdomain, config.domain, request.owner
    ));

    let job_id = JobId::generate();
    let mut updates = tracker.subscribe();
    let run = orchestrator.run_job(job_id.clone(), request);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Ok(update) = updates.recv() => {
                if update.job_id == job_id {
                    output.step(&update);
                }
            }
        }
    };
    while let Ok(update) = updates.try_recv() {
        if update.job_id == job_id {
            output.step(&update);
        }
    }

    match result {
        Ok(report) => {
            output.report(&report);
            Ok(())
        }
        Err(failure) => {
            output.error(&failure.to_string());
            Err(failure.into())
        }
    }
}
