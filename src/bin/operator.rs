//! Flink Kubernetes Operator binary.
//!
//! Runs the FlinkCluster controller against the current cluster context, or
//! emits the CRD YAML with `--generate-crds`.

use flink_operator::controller::{
    error_policy, ClusterController, ControllerContext, LoggingOrchestrator, ReconcileAction,
};
use flink_operator::crd::FlinkCluster;
use futures::StreamExt;
use kube::runtime::controller::Action;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flink_operator=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .init();

    if std::env::args().any(|arg| arg == "--generate-crds") {
        println!("---");
        println!("{}", serde_yaml::to_string(&FlinkCluster::crd())?);
        return Ok(());
    }

    tracing::info!("Starting Flink Kubernetes Operator");

    let client = Client::try_default().await?;
    tracing::info!("Connected to Kubernetes cluster");

    let ctx = Arc::new(ControllerContext::new(
        client.clone(),
        Arc::new(LoggingOrchestrator),
    ));
    let clusters: Api<FlinkCluster> = Api::all(client);
    let controller = ClusterController::new(ctx.clone());

    Controller::new(clusters, WatcherConfig::default())
        .shutdown_on_signal()
        .run(
            move |cluster, _ctx| {
                let controller = controller.clone();
                async move {
                    match controller.reconcile(cluster).await? {
                        ReconcileAction::Requeue(duration) => Ok(Action::requeue(duration)),
                        ReconcileAction::Done => Ok(Action::await_change()),
                    }
                }
            },
            error_policy,
            ctx,
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    tracing::debug!(cluster = %obj.name, ?action, "Reconciled cluster");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Controller stream error");
                }
            }
        })
        .await;

    tracing::info!("Controller terminated");
    Ok(())
}
