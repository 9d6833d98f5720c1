/// Arrow schema for the consolidated review report.
pub mod report {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Output column order. Every column is nullable: a record missing a
    /// value is emitted with a null in that position.
    pub const COLUMNS: [&str; 10] = [
        "city",
        "branch_name",
        "review_date",
        "review_text",
        "who_gave_the_review",
        "overall_sentiment",
        "sentiment_score",
        "primary_issue",
        "severity",
        "summary",
    ];

    fn data_type(column: &str) -> DataType {
        match column {
            "sentiment_score" | "severity" => DataType::Int64,
            _ => DataType::Utf8,
        }
    }

    /// Schema for the report table, in [`COLUMNS`] order.
    pub fn report_schema() -> Schema {
        Schema::new(
            COLUMNS
                .iter()
                .map(|name| Field::new(*name, data_type(name), true))
                .collect::<Vec<_>>(),
        )
    }
}
