pub mod batch;
pub mod filename;
pub mod prompt;

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::model::work_item::WorkItem;
use crate::providers::WorkItemSource;

use prompt::Prompt;

pub const NO_CRITERIA_PLACEHOLDER: &str = "(No acceptance criteria found)";
const RULE_WIDTH: usize = 50;

/// Progress of a single export. Stages only move forward; a failure leaves
/// the exporter at the last stage it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Configured,
    Fetched,
    Named,
    Written,
}

/// What was written for one work item.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    pub id: u32,
    pub title: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub has_criteria: bool,
}

pub struct Exporter<S> {
    config: Config,
    source: S,
    stage: ExportStage,
}

/// Build an exporter from a configuration load result. The source is only
/// constructed once configuration has succeeded, so a bad configuration
/// never reaches the network.
pub fn start<S, F>(config: Result<Config>, connect: F) -> Result<Exporter<S>>
where
    S: WorkItemSource,
    F: FnOnce(&Config) -> Result<S>,
{
    let config = config?;
    let source = connect(&config)?;
    tracing::debug!(
        source = source.name(),
        config = ?config,
        from = ?ExportStage::Idle,
        to = ?ExportStage::Configured,
        "configured"
    );
    Ok(Exporter::new(config, source))
}

impl<S: WorkItemSource> Exporter<S> {
    pub fn new(config: Config, source: S) -> Self {
        Self {
            config,
            source,
            stage: ExportStage::Configured,
        }
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_filename(&self, item: &WorkItem) -> String {
        filename::derive(&self.config.prefix, item.id, &item.title)
    }

    async fn fetch(&mut self, id: u32) -> Result<WorkItem> {
        self.stage = ExportStage::Configured;
        let item = self.source.fetch(id).await?;
        self.stage = ExportStage::Fetched;
        tracing::debug!(id, title = %item.title, "fetched work item");
        Ok(item)
    }

    fn write(&mut self, item: &WorkItem, file_name: &str) -> Result<ExportRecord> {
        self.stage = ExportStage::Named;
        let dir = &self.config.output_dir;
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
            tracing::info!(dir = %dir.display(), "created output directory");
        }

        let path = dir.join(file_name);
        let content = compose(item);
        std::fs::write(&path, content.as_bytes()).map_err(|e| ExportError::io(&path, e))?;
        self.stage = ExportStage::Written;
        tracing::info!(path = %path.display(), bytes = content.len(), "wrote export");

        Ok(ExportRecord {
            id: item.id,
            title: item.title.clone(),
            path,
            bytes: content.len(),
            has_criteria: item.has_criteria(),
        })
    }

    /// Fetch `id` and write it under `file_name`, or the default filename
    /// when none is given.
    pub async fn export(&mut self, id: u32, file_name: Option<&str>) -> Result<ExportRecord> {
        let item = self.fetch(id).await?;
        let name = match file_name {
            Some(name) => name.to_string(),
            None => self.default_filename(&item),
        };
        self.write(&item, &name)
    }

    /// Interactive single export: ask for an id until a valid one is given,
    /// fetch it, offer the default filename for override, then write.
    pub async fn run_interactive<P: Prompt>(&mut self, prompt: &mut P) -> Result<ExportRecord> {
        let id = ask_for_id(prompt)?;
        let item = self.fetch(id).await?;

        prompt.notice(&format!("Found {}: {}", item.item_type, item.title));
        if !item.has_criteria() {
            prompt.notice("Warning: this work item has no acceptance criteria");
        }

        let default_name = self.default_filename(&item);
        let question = format!("Filename (press Enter for {default_name})");
        let name = match prompt.ask(&question)? {
            Some(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => default_name,
        };

        self.write(&item, &name)
    }
}

fn ask_for_id<P: Prompt>(prompt: &mut P) -> Result<u32> {
    loop {
        let Some(answer) = prompt.ask("Enter work item ID")? else {
            return Err(ExportError::Input("no work item ID provided".into()));
        };
        match parse_id(&answer) {
            Some(id) => return Ok(id),
            None => prompt.notice(&format!(
                "'{}' is not a valid work item ID; enter a positive number",
                answer.trim()
            )),
        }
    }
}

/// Parse a positive work item id.
pub fn parse_id(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|id| *id > 0)
}

/// Text written for one work item: a header block, a rule, then the criteria.
pub fn compose(item: &WorkItem) -> String {
    let body = if item.has_criteria() {
        item.acceptance_criteria.as_str()
    } else {
        NO_CRITERIA_PLACEHOLDER
    };
    format!(
        "User Story ID: {}\nTitle: {}\nType: {}\n{}\n\nACCEPTANCE CRITERIA:\n\n{body}",
        item.id,
        item.title,
        item.item_type,
        "=".repeat(RULE_WIDTH),
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::Path;

    use super::prompt::ScriptedPrompt;
    use super::*;
    use crate::providers::tests::{make_work_item, Canned, MockSource};

    fn config(dir: &Path) -> Config {
        Config {
            organization: "contoso".into(),
            project: "eNcounter".into(),
            pat: "secret".into(),
            prefix: "eNr".into(),
            output_dir: dir.to_path_buf(),
            base_url: "http://unused".into(),
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        if !dir.exists() {
            return Vec::new();
        }
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn compose_layout() {
        let item = make_work_item(118556, "eNcounter Refresh: Loading Screen", "Given a\nThen b");
        let text = compose(&item);
        assert_eq!(
            text,
            format!(
                "User Story ID: 118556\nTitle: eNcounter Refresh: Loading Screen\nType: User Story\n{}\n\nACCEPTANCE CRITERIA:\n\nGiven a\nThen b",
                "=".repeat(50)
            )
        );
    }

    #[test]
    fn parse_id_rejects_junk() {
        assert_eq!(parse_id(" 118556 "), Some(118556));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn missing_config_never_connects() {
        let connected = Cell::new(false);
        let source = MockSource::new();
        let calls = source.calls.clone();
        let result = start(
            Err(ExportError::missing_keys(&["AZURE_DEVOPS_PAT"])),
            |_cfg: &Config| {
                connected.set(true);
                Ok(source)
            },
        );
        assert!(matches!(result, Err(ExportError::Config(_))));
        assert!(!connected.get());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn interactive_export_with_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("userstories");
        let source = MockSource::new().with_item(make_work_item(
            118556,
            "eNcounter Refresh: Loading Screen",
            "Given the app starts\nThen a spinner shows",
        ));
        let mut exporter = start(Ok(config(&out)), |_| Ok(source)).unwrap();
        assert_eq!(exporter.stage(), ExportStage::Configured);

        let mut prompt = ScriptedPrompt::new(&["118556", ""]);
        let record = exporter.run_interactive(&mut prompt).await.unwrap();

        assert_eq!(exporter.stage(), ExportStage::Written);
        assert_eq!(record.path, out.join("eNr_118556_loading_screen.us.txt"));
        let written = std::fs::read_to_string(&record.path).unwrap();
        assert_eq!(record.bytes, written.len());
        assert!(written.contains("Then a spinner shows"));
        assert!(record.has_criteria);
        assert!(prompt.questions[1].contains("eNr_118556_loading_screen.us.txt"));
    }

    #[tokio::test]
    async fn invalid_ids_are_reprompted() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new().with_item(make_work_item(42, "Story", "Then ok"));
        let calls = source.calls.clone();
        let mut exporter = Exporter::new(config(dir.path()), source);

        let mut prompt = ScriptedPrompt::new(&["abc", "", "0", "42", ""]);
        let record = exporter.run_interactive(&mut prompt).await.unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(calls.lock().unwrap().as_slice(), &[42]);
        assert!(prompt.saw("'abc' is not a valid work item ID"));
        assert!(prompt.saw("'0' is not a valid work item ID"));
    }

    #[tokio::test]
    async fn end_of_input_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new();
        let calls = source.calls.clone();
        let mut exporter = Exporter::new(config(dir.path()), source);
        let mut prompt = ScriptedPrompt::new(&["nope"]);
        let err = exporter.run_interactive(&mut prompt).await.unwrap_err();
        assert!(matches!(err, ExportError::Input(_)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn filename_override_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new().with_item(make_work_item(7, "A: B", "Then c"));
        let mut exporter = Exporter::new(config(dir.path()), source);
        let mut prompt = ScriptedPrompt::new(&["7", "My Custom Name.txt"]);
        let record = exporter.run_interactive(&mut prompt).await.unwrap();
        assert_eq!(record.path, dir.path().join("My Custom Name.txt"));
        assert!(record.path.exists());
    }

    #[tokio::test]
    async fn not_found_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("userstories");
        let mut exporter = Exporter::new(config(&out), MockSource::new());
        let mut prompt = ScriptedPrompt::new(&["404", ""]);

        let err = exporter.run_interactive(&mut prompt).await.unwrap_err();

        assert!(matches!(err, ExportError::NotFound(404)));
        assert_eq!(exporter.stage(), ExportStage::Configured);
        assert!(files_in(&out).is_empty());
        // filename prompt never reached
        assert_eq!(prompt.questions.len(), 1);
    }

    #[tokio::test]
    async fn auth_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new().with_answer(5, Canned::Unauthorized);
        let mut exporter = Exporter::new(config(dir.path()), source);
        let err = exporter.export(5, None).await.unwrap_err();
        assert!(matches!(err, ExportError::Auth { .. }));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn empty_criteria_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new().with_item(make_work_item(9, "Epic: Platform", ""));
        let mut exporter = Exporter::new(config(dir.path()), source);
        let record = exporter.export(9, None).await.unwrap();

        assert!(!record.has_criteria);
        let written = std::fs::read_to_string(&record.path).unwrap();
        assert!(written.ends_with(NO_CRITERIA_PLACEHOLDER));
        assert_eq!(
            record.path.file_name().unwrap().to_string_lossy(),
            "eNr_9_platform.us.txt"
        );
    }

    #[tokio::test]
    async fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("eNr_3_story.us.txt");
        std::fs::write(&target, "stale contents that are much longer than the new export").unwrap();

        let source = MockSource::new().with_item(make_work_item(3, "Story", "Then fresh"));
        let mut exporter = Exporter::new(config(dir.path()), source);
        let record = exporter.export(3, None).await.unwrap();

        assert_eq!(record.path, target);
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(!written.contains("stale"));
        assert!(written.ends_with("Then fresh"));
    }

    #[tokio::test]
    async fn unwritable_output_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("userstories");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let source = MockSource::new().with_item(make_work_item(1, "Story", "Then x"));
        let mut exporter = Exporter::new(config(&blocker), source);
        let err = exporter.export(1, None).await.unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
        assert_eq!(exporter.stage(), ExportStage::Named);
    }
}
