//! Synchronous workflow orchestrator
//!
//! Runs a workflow's steps strictly in order, one flow of control per job.
//! Per step the data flow is:
//!
//! `state => xin transform => in => function(in) => out => xout transform => state`
//!
//! The context is checkpointed at every phase boundary (after the input
//! transform, after the function call, after the output transform), so a
//! restart or an operator can see exactly which phase of which step last
//! completed. Transform expressions are user-authored and can be wrong; the
//! in/out record per step gives full provenance of a job's evolution.
//!
//! No retries: the first failed transform or function call is terminal for
//! the job, leaving the last checkpoint as the durable state.
// TODO: per-step timeout configuration for the HTTP dispatch

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::domain::{FailureDetails, FunctionDescriptor, JobFailure, Workflow};
use crate::infrastructure::dispatch::{DispatchError, FunctionDispatcher};
use crate::infrastructure::workspace::{Workspace, WorkspaceError};

pub struct Orchestrator {
    workspace: Arc<Workspace>,
    dispatcher: Arc<dyn FunctionDispatcher>,
}

impl Orchestrator {
    pub fn new(workspace: Arc<Workspace>, dispatcher: Arc<dyn FunctionDispatcher>) -> Self {
        Self {
            workspace,
            dispatcher,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run a workflow synchronously, writing state to the workspace, and
    /// return the final state value. On failure the job halts where it is;
    /// everything up to the last checkpoint stays durably persisted.
    pub async fn run(&self, workflow: &Workflow, input: &Value) -> Result<Value, JobFailure> {
        let job_id = workflow.job_id.as_str();
        debug!("Job {}: starting, {} steps", job_id, workflow.steps.len());

        let mut details = FailureDetails::for_job(job_id);

        self.workspace
            .create_workspace(workflow, input)
            .await
            .map_err(|e| storage_failure(details.clone(), e))?;

        let mut context = self
            .workspace
            .get_context(job_id)
            .await
            .map_err(|e| storage_failure(details.clone(), e))?;

        for (step_number, step) in workflow.steps.iter().enumerate() {
            debug!(
                "Job {}: processing step {}/{}",
                job_id,
                step_number,
                workflow.steps.len()
            );

            let descriptor = FunctionDescriptor::parse(&step.function);
            context.begin_step(&step.id);
            details.at_step(step_number, &step.id, &descriptor.label());

            // 1: prepare input
            if !step.input_transform.trim().is_empty() {
                match self.workspace.transform_context(&context, &step.input_transform) {
                    Ok(state) => context.state = state,
                    Err(e) => {
                        error!("Job {}: input JMESPath transformation failed: {}", job_id, e);
                        details.expression = Some(step.input_transform.clone());
                        return Err(JobFailure::bad_request(
                            details,
                            "Invalid input JMESPath expression",
                            Some(e.to_string()),
                        ));
                    }
                }
            }

            // Checkpoint before side-effecting work
            self.workspace
                .update_context(job_id, &context)
                .await
                .map_err(|e| storage_failure(details.clone(), e))?;

            // 2: invoke function
            match &descriptor {
                FunctionDescriptor::None => {}

                FunctionDescriptor::Internal { name } if name == "stop" => {
                    debug!("Job {}: stop requested, ending job", job_id);
                    return Ok(context.state);
                }

                FunctionDescriptor::Internal { name } => {
                    error!("Job {}: unknown internal function {}", job_id, name);
                    return Err(JobFailure::not_found(
                        details,
                        format!("Unknown internal function {}", name),
                        None,
                    ));
                }

                FunctionDescriptor::Http { .. } => {
                    match self.dispatcher.execute(&descriptor, &context.state).await {
                        Ok(state) => context.state = state,
                        Err(e) => {
                            error!("Job {}: function '{}' failed", job_id, step.function);
                            return Err(dispatch_failure(details, &step.function, e));
                        }
                    }
                }
            }

            // Checkpoint after the function, before the output transform
            if descriptor != FunctionDescriptor::None {
                self.workspace
                    .update_context(job_id, &context)
                    .await
                    .map_err(|e| storage_failure(details.clone(), e))?;
            }

            // 3: output transformation
            if !step.output_transform.trim().is_empty() {
                match self.workspace.transform_context(&context, &step.output_transform) {
                    Ok(state) => context.state = state,
                    Err(e) => {
                        error!("Job {}: output JMESPath transformation failed: {}", job_id, e);
                        details.expression = Some(step.output_transform.clone());
                        return Err(JobFailure::bad_request(
                            details,
                            "Invalid output JMESPath expression",
                            Some(e.to_string()),
                        ));
                    }
                }
            }

            context.end_step(&step.id);
            self.workspace
                .update_context(job_id, &context)
                .await
                .map_err(|e| storage_failure(details.clone(), e))?;
        }

        debug!("Job {}: completed", job_id);
        Ok(context.state)
    }
}

fn storage_failure(details: FailureDetails, error: WorkspaceError) -> JobFailure {
    error!("Job {}: workspace storage failure: {}", details.job_id, error);
    JobFailure::internal(details, "Workspace storage error", Some(error.to_string()))
}

fn dispatch_failure(mut details: FailureDetails, function: &str, error: DispatchError) -> JobFailure {
    match error {
        DispatchError::ToolNotAvailable { .. } => JobFailure::not_found(
            details,
            format!("Function {} not found, HTTP client not available", function),
            Some(format!(
                "There is no HTTP client for '{}', the name could be wrong or the tool is not registered",
                function
            )),
        ),
        DispatchError::FunctionNotFound { description, response } => {
            details.with_response(response);
            JobFailure::not_found(details, "Function not found", Some(description))
        }
        DispatchError::InvalidCall { description, response } => {
            details.with_response(response);
            JobFailure::bad_request(details, "Invalid call to function", Some(description))
        }
        DispatchError::Backend { description, response } => {
            details.with_response(response);
            JobFailure::internal(details, "Function error", Some(description))
        }
        DispatchError::Request(message) => {
            JobFailure::internal(details, "Function error", Some(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureKind, Step};
    use crate::infrastructure::storage::InMemoryFileStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted dispatcher: maps a tool name to a canned outcome and records
    /// every invocation in order
    #[derive(Default)]
    struct ScriptedDispatcher {
        outcomes: HashMap<String, Outcome>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    enum Outcome {
        Reply(Value),
        /// Echo the request body back under the given key
        Wrap(&'static str),
        Fail(u16, &'static str),
    }

    impl ScriptedDispatcher {
        fn with(mut self, tool: &str, outcome: Outcome) -> Self {
            self.outcomes.insert(tool.to_string(), outcome);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl FunctionDispatcher for ScriptedDispatcher {
        async fn execute(
            &self,
            descriptor: &FunctionDescriptor,
            state: &Value,
        ) -> Result<Value, DispatchError> {
            let FunctionDescriptor::Http { tool, .. } = descriptor else {
                panic!("scripted dispatcher only handles http functions");
            };
            self.calls.lock().unwrap().push((tool.clone(), state.clone()));

            match self.outcomes.get(tool) {
                Some(Outcome::Reply(value)) => Ok(value.clone()),
                Some(Outcome::Wrap(key)) => Ok(json!({ *key: state })),
                Some(Outcome::Fail(404, body)) => Err(DispatchError::FunctionNotFound {
                    description: "scripted 404".to_string(),
                    response: body.to_string(),
                }),
                Some(Outcome::Fail(400, body)) => Err(DispatchError::InvalidCall {
                    description: "scripted 400".to_string(),
                    response: body.to_string(),
                }),
                Some(Outcome::Fail(_, body)) => Err(DispatchError::Backend {
                    description: "scripted 5xx".to_string(),
                    response: body.to_string(),
                }),
                None => Err(DispatchError::ToolNotAvailable {
                    function: descriptor.label(),
                }),
            }
        }
    }

    fn orchestrator(dispatcher: ScriptedDispatcher) -> (Arc<ScriptedDispatcher>, Orchestrator) {
        let dispatcher = Arc::new(dispatcher);
        let workspace = Arc::new(Workspace::new(Arc::new(InMemoryFileStore::new()), "ws"));
        (dispatcher.clone(), Orchestrator::new(workspace, dispatcher))
    }

    fn step(id: &str, function: &str, xin: &str, xout: &str) -> Step {
        Step {
            id: id.to_string(),
            function: function.to_string(),
            input_transform: xin.to_string(),
            output_transform: xout.to_string(),
        }
    }

    fn workflow(job_id: &str, steps: Vec<Step>) -> Workflow {
        Workflow {
            job_id: job_id.to_string(),
            steps,
        }
    }

    #[tokio::test]
    async fn test_empty_step_list_passes_input_through() {
        let (_, orchestrator) = orchestrator(ScriptedDispatcher::default());
        let result = orchestrator
            .run(&workflow("j1", vec![]), &json!({"foo": "bar"}))
            .await
            .unwrap();

        assert_eq!(result, json!({"foo": "bar"}));

        // All three artifacts exist even for a no-op job
        let context = orchestrator.workspace().get_context("j1").await.unwrap();
        assert_eq!(context.start, json!({"foo": "bar"}));
    }

    #[tokio::test]
    async fn test_state_threads_through_steps() {
        let (dispatcher, orchestrator) = orchestrator(
            ScriptedDispatcher::default()
                .with("fetch", Outcome::Reply(json!({"body": "text"})))
                .with("chunk", Outcome::Wrap("chunked")),
        );

        let wf = workflow(
            "j1",
            vec![step("a", "fetch/get", "", ""), step("b", "chunk/split", "", "")],
        );
        let result = orchestrator.run(&wf, &json!({"url": "u"})).await.unwrap();

        assert_eq!(result, json!({"chunked": {"body": "text"}}));
        assert_eq!(dispatcher.calls(), vec!["fetch", "chunk"]);

        // Per-step provenance
        let context = orchestrator.workspace().get_context("j1").await.unwrap();
        assert_eq!(context.steps["a"].input, json!({"url": "u"}));
        assert_eq!(context.steps["a"].output, Some(json!({"body": "text"})));
        assert_eq!(context.steps["b"].output, Some(json!({"chunked": {"body": "text"}})));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_deterministic() {
        let build = || {
            ScriptedDispatcher::default()
                .with("fetch", Outcome::Reply(json!({"n": 1})))
                .with("sum", Outcome::Wrap("total"))
        };
        let wf = workflow(
            "jx",
            vec![step("f", "fetch/get", "", ""), step("s", "sum/add", "", "")],
        );

        let (_, first) = orchestrator(build());
        let (_, second) = orchestrator(build());
        let r1 = first.run(&wf, &json!({"seed": 9})).await.unwrap();
        let r2 = second.run(&wf, &json!({"seed": 9})).await.unwrap();

        assert_eq!(r1, r2);
        let c1 = first.workspace().get_context("jx").await.unwrap();
        let c2 = second.workspace().get_context("jx").await.unwrap();
        assert_eq!(
            serde_json::to_string(&c1).unwrap(),
            serde_json::to_string(&c2).unwrap()
        );
    }

    #[tokio::test]
    async fn test_stop_short_circuits_remaining_steps() {
        let (dispatcher, orchestrator) = orchestrator(
            ScriptedDispatcher::default()
                .with("first", Outcome::Reply(json!("after-first")))
                .with("second", Outcome::Reply(json!("never"))),
        );

        let wf = workflow(
            "j1",
            vec![
                step("a", "first/run", "", ""),
                step("halt", "stop", "", ""),
                step("b", "second/run", "", ""),
            ],
        );
        let result = orchestrator.run(&wf, &json!({})).await.unwrap();

        assert_eq!(result, json!("after-first"));
        assert_eq!(dispatcher.calls(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_checkpoint_before_failed_call() {
        let (_, orchestrator) = orchestrator(
            ScriptedDispatcher::default()
                .with("ok", Outcome::Reply(json!({"fine": true})))
                .with("boom", Outcome::Fail(500, "backend exploded")),
        );

        let wf = workflow(
            "j1",
            vec![
                step("good", "ok/run", "", ""),
                step("bad", "boom/run", "", ""),
                step("after", "ok/run", "", ""),
            ],
        );
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Internal);

        // Step "bad" has its entry state persisted but no exit; "after" never started
        let context = orchestrator.workspace().get_context("j1").await.unwrap();
        assert_eq!(context.steps["bad"].input, json!({"fine": true}));
        assert!(context.steps["bad"].output.is_none());
        assert!(!context.steps.contains_key("after"));
    }

    #[tokio::test]
    async fn test_input_transform_sees_start_after_mutations() {
        let (dispatcher, orchestrator) = orchestrator(
            ScriptedDispatcher::default()
                .with("a", Outcome::Reply(json!({"noise": 1})))
                .with("b", Outcome::Reply(json!({"noise": 2})))
                .with("c", Outcome::Reply(json!({"noise": 3})))
                .with("reader", Outcome::Wrap("got")),
        );

        let wf = workflow(
            "j1",
            vec![
                step("s1", "a/x", "", ""),
                step("s2", "b/x", "", ""),
                step("s3", "c/x", "", ""),
                step("s4", "reader/x", "start.input.page", ""),
            ],
        );
        orchestrator
            .run(&wf, &json!({"input": {"page": 42}}))
            .await
            .unwrap();

        // The reader received the original submission field, not the mutated state
        let (_, body) = dispatcher.calls.lock().unwrap().last().unwrap().clone();
        assert_eq!(body, json!(42));
    }

    #[tokio::test]
    async fn test_output_transform_replaces_state() {
        let (_, orchestrator) = orchestrator(
            ScriptedDispatcher::default().with("fetch", Outcome::Reply(json!({"body": "x", "meta": 1}))),
        );

        let wf = workflow("j1", vec![step("f", "fetch/get", "", "{text: f.in, body: state.body}")]);
        let result = orchestrator.run(&wf, &json!("orig")).await.unwrap();
        assert_eq!(result, json!({"text": "orig", "body": "x"}));
    }

    #[tokio::test]
    async fn test_bad_input_expression_is_bad_request() {
        let (dispatcher, orchestrator) =
            orchestrator(ScriptedDispatcher::default().with("t", Outcome::Reply(json!(1))));

        let wf = workflow("j1", vec![step("s", "t/x", "state.[", "")]);
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::BadRequest);
        assert_eq!(failure.details.expression.as_deref(), Some("state.["));
        assert_eq!(
            failure.details.message.as_deref(),
            Some("Invalid input JMESPath expression")
        );
        // The function was never called
        assert!(dispatcher.calls().is_empty());

        // Progress up to the checkpoint is durable
        let context = orchestrator.workspace().get_context("j1").await.unwrap();
        assert!(context.steps.contains_key("s"));
    }

    #[tokio::test]
    async fn test_bad_output_expression_is_bad_request() {
        let (_, orchestrator) =
            orchestrator(ScriptedDispatcher::default().with("t", Outcome::Reply(json!(1))));

        let wf = workflow("j1", vec![step("s", "t/x", "", "][")]);
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::BadRequest);
        assert_eq!(
            failure.details.message.as_deref(),
            Some("Invalid output JMESPath expression")
        );
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_not_found() {
        let (_, orchestrator) = orchestrator(ScriptedDispatcher::default());

        let wf = workflow("j1", vec![step("s", "ghost/run", "", "")]);
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::NotFound);
        assert!(failure.details.message.as_deref().unwrap().contains("ghost/run"));
    }

    #[tokio::test]
    async fn test_backend_400_maps_to_bad_request_with_response() {
        let (_, orchestrator) = orchestrator(
            ScriptedDispatcher::default().with("t", Outcome::Fail(400, "bad field\nmissing id")),
        );

        let wf = workflow("j1", vec![step("s", "t/x", "", "")]);
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::BadRequest);
        assert_eq!(failure.details.message.as_deref(), Some("Invalid call to function"));
        let lines = failure.details.response_lines.as_ref().unwrap();
        assert_eq!(lines["l0"], "bad field");
        assert_eq!(lines["l1"], "missing id");
    }

    #[tokio::test]
    async fn test_failure_details_carry_step_position() {
        let (_, orchestrator) = orchestrator(
            ScriptedDispatcher::default()
                .with("ok", Outcome::Reply(json!(1)))
                .with("boom", Outcome::Fail(500, "err")),
        );

        let wf = workflow(
            "j7",
            vec![step("a", "ok/x", "", ""), step("b", "boom/y", "", "")],
        );
        let failure = orchestrator.run(&wf, &json!({})).await.unwrap_err();

        assert_eq!(failure.details.job_id, "j7");
        assert_eq!(failure.details.step_number, Some(1));
        assert_eq!(failure.details.step_id.as_deref(), Some("b"));
        assert_eq!(failure.details.function.as_deref(), Some("boom/y/"));
    }

    #[tokio::test]
    async fn test_transform_only_step_runs_without_function() {
        let (_, orchestrator) = orchestrator(ScriptedDispatcher::default());

        let wf = workflow("j1", vec![step("reshape", "", "{p: start.page}", "")]);
        let result = orchestrator.run(&wf, &json!({"page": 5})).await.unwrap();
        assert_eq!(result, json!({"p": 5}));
    }
}
