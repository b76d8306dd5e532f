#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSchema {
    ProV1,
    RegularV1,
    RegularV2,
    Testing,
}

// Checked top to bottom; the first phrase contained in the label wins.
const SCHEMA_PHRASES: &[(&str, TaskSchema)] = &[
    ("mindful", TaskSchema::ProV1),
    ("Having looked", TaskSchema::RegularV1),
    ("stops, please choose the number", TaskSchema::RegularV2),
    ("choose the number", TaskSchema::RegularV2),
    ("Mark the first well contain", TaskSchema::Testing),
];

pub fn detect_schema(task_label: &str) -> Option<TaskSchema> {
    SCHEMA_PHRASES
        .iter()
        .find(|(phrase, _)| task_label.contains(phrase))
        .map(|(_, schema)| *schema)
}
