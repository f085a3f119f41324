//! Prompt construction.
//!
//! Every request carries two texts: the fixed rules for the active action
//! schema (system message) and the rendered state of the conversation
//! (user message). The model keeps nothing between requests, so the state
//! text is all it knows about what happened so far.

use naruhod_core::{
    ActionKind, ActionResult, ActionSchema, ActivityLogEntry, GlobalContext, TurnContext,
};
use serde::Serialize;

/// Builds prompts that share one directory snapshot and one schema.
#[derive(Debug, Clone)]
pub struct PromptFactory {
    directory_structure: String,
    schema: ActionSchema,
}

impl PromptFactory {
    pub fn new(directory_structure: impl Into<String>, schema: ActionSchema) -> Self {
        Self {
            directory_structure: directory_structure.into(),
            schema,
        }
    }

    pub fn schema(&self) -> ActionSchema {
        self.schema
    }

    /// The first request: no context, no history, no results.
    pub fn kickoff(&self, global: &GlobalContext) -> Prompt {
        self.create(global, TurnContext::new(), Vec::new(), Vec::new())
    }

    pub fn create(
        &self,
        global: &GlobalContext,
        context: TurnContext,
        activity_log: Vec<ActivityLogEntry>,
        last_action_results: Vec<ActionResult>,
    ) -> Prompt {
        Prompt {
            global_context: global.clone(),
            context,
            activity_log,
            last_action_results,
            directory_structure: self.directory_structure.clone(),
            schema: self.schema,
        }
    }
}

/// One request's worth of state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub global_context: GlobalContext,
    pub context: TurnContext,
    pub activity_log: Vec<ActivityLogEntry>,
    pub last_action_results: Vec<ActionResult>,
    #[serde(skip)]
    pub directory_structure: String,
    #[serde(skip)]
    pub schema: ActionSchema,
}

impl Prompt {
    /// The rules text for the active schema.
    pub fn rules(&self) -> String {
        rules_for(self.schema)
    }

    /// The state text: task, workspace, carried context and last results.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Global Context:\ntaskDescription: {}\nsubTasks: {}\nInitial Directory Structure:\n{}\n\n",
            json(&self.global_context.task_description),
            json(&self.global_context.sub_tasks),
            self.directory_structure,
        );

        out.push_str("Current Context:\n");
        if self.schema == ActionSchema::V1 {
            let memo = self.context.hand_over_memo.as_deref().unwrap_or("null");
            out.push_str(&format!("handOverMemo: {}\n", json(&memo)));
        }
        out.push_str(&format!("memory: {}\n", json(&self.context.memory)));

        if self.schema.accepts(ActionKind::RecordActivityLog) {
            out.push_str(&format!("\nActivity Log:\n{}\n", json(&self.activity_log)));
        }

        out.push_str(&format!(
            "\nLast Action Results:\n{}\n",
            json(&self.last_action_results)
        ));
        out
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".into())
}

fn describe(kind: ActionKind) -> (&'static str, &'static str) {
    match kind {
        ActionKind::SetMemory => (
            "Replace the \"memory\" field of the next context. Use it for data that must survive, such as totals or findings.",
            r#"{ "type": "setMemory", "reason": "Store the current sum", "options": { "memory": { "sum": 10, "lastNumber": 5 } } }"#,
        ),
        ActionKind::RecordActivityLog => (
            "Record what you did this turn, your picture of the whole task and what you expect to do next. Entries are shown back to you under \"Activity Log\".",
            r#"{ "type": "recordActivityLog", "reason": "Keep track of progress", "options": { "assumedWholeTaskFlow": "inspect files, fix file1, verify", "thisTimeActivityLog": "listed the project files", "assumedNextAction": "read file1.txt" } }"#,
        ),
        ActionKind::ExecuteCommand => (
            "Run a shell command. Its output (and any error) comes back under \"Last Action Results\".",
            r#"{ "type": "executeCommand", "reason": "List the files", "options": { "command": "ls -al" } }"#,
        ),
        ActionKind::TaskDone => (
            "End the task because it is complete. Put a short report in \"options.report\".",
            r#"{ "type": "taskDone", "reason": "The summation task is complete", "options": { "report": "sum is 23" } }"#,
        ),
        ActionKind::TaskRejected => (
            "End the task because it cannot or must not be done. Explain why in \"reason\".",
            r#"{ "type": "taskRejected", "reason": "The requested file does not exist and cannot be created" }"#,
        ),
        ActionKind::SetHandOverMemo => (
            "Replace the \"handOverMemo\" field of the next context. Use it for concise next-step instructions.",
            r#"{ "type": "setHandOverMemo", "reason": "Update memo for the next steps", "options": { "memo": "Add the new number to sum and check if sum > 20" } }"#,
        ),
        ActionKind::ReadNextNumber => (
            "Request the next number in the sequence.",
            r#"{ "type": "readNextNumber", "reason": "Request the next number in the sequence" }"#,
        ),
    }
}

/// Render the rules text for one schema generation.
pub fn rules_for(schema: ActionSchema) -> String {
    let kinds = schema.kinds();
    let tags: Vec<&str> = kinds.iter().map(|k| k.tag()).collect();
    let carried = match schema {
        ActionSchema::V1 => "`setHandOverMemo` and `setMemory`",
        ActionSchema::V2 => "`setMemory` and `recordActivityLog`",
    };

    let mut out = format!(
        r#"Global Rule (action schema v{version}):
1. You must respond in JSON only. The structure should be:
   {{
     "actions": [
       {{ "type": "<{tags}>", "reason": "string", "options": {{ ...optional }} }}
     ]
   }}
2. Once the task is done, respond with the "taskDone" action to end it. If it cannot or must not be done, respond with "taskRejected". Check the completion condition in every step.
3. Actions run in order. A "taskDone" or "taskRejected" ends the task immediately; actions after it are ignored.
4. The "Current Context" is reset every turn. Only what you save with {carried} is carried over to the next prompt, so save everything you will need.
5. Do not include any text outside the JSON response.
6. "executeCommand" runs shell commands to read or write files or to perform other tasks. To read two files, either write one command that handles both or split it into two actions.
7. Available actions:
"#,
        version = schema.version(),
        tags = tags.join("|"),
    );
    for kind in kinds {
        let (description, example) = describe(*kind);
        out.push_str(&format!(
            "   - **{}**: {description}\n     Example:\n     {example}\n",
            kind.tag()
        ));
    }
    out.push_str(
        "\n### Tips:\n\
         - Use `executeCommand` effectively. Combine or split commands as the situation requires.\n\
         - Check the completion condition after each step.\n\
         - Validate the final state before responding with `taskDone`.\n",
    );
    out
}
