use crate::document::{ProjectDocument, ProjectMeta, SharedRef};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Fixed configuration record for freshly created empty projects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultProjectConfig {
    /// Default device target.
    pub target: String,

    /// Serialized empty block workspace.
    pub blocks_xml: String,

    /// Name of the placeholder script in the file tree.
    pub script_name: String,

    /// Body of the placeholder script.
    pub script_body: String,

    /// Display name of a new project.
    pub project_name: String,
}

impl Default for DefaultProjectConfig {
    fn default() -> Self {
        Self {
            target: "esp32".to_string(),
            blocks_xml: "<xml xmlns=\"https://bipes.net.br/ide\"></xml>".to_string(),
            script_name: "script.py".to_string(),
            script_body: "# Create your script here".to_string(),
            project_name: "Empty project".to_string(),
        }
    }
}

impl DefaultProjectConfig {
    /// Builds a new empty project authored by `author` at time `now`.
    pub fn build(&self, author: &str, now: i64) -> ProjectDocument {
        ProjectDocument {
            device: json!({ "target": self.target }),
            blocks: json!({ "xml": self.blocks_xml }),
            files: json!({
                "tree": {
                    "name": "",
                    "files": [{
                        "name": self.script_name,
                        "script": self.script_body,
                    }]
                }
            }),
            project: ProjectMeta {
                name: self.project_name.clone(),
                author: author.to_string(),
                shared: SharedRef::default(),
                created_at: now,
                last_edited: now,
            },
        }
    }
}
