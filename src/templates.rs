pub const CLIENT_PY_TMPL: &str = include_str!("../templates/client.py.tmpl");
pub const FLOW_PY_TMPL: &str = include_str!("../templates/flow.py.tmpl");
pub const TEST_PY_TMPL: &str = include_str!("../templates/test.py.tmpl");
pub const UNDERSTAND_TASK_PROMPT_MD: &str = include_str!("../prompts/understand_task.md");
