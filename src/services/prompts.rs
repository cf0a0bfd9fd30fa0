use crate::models::dataset::{ColumnKind, Dataset};

/// Andy's personality, sent as the system prompt
pub const ANDY_SYSTEM_PROMPT: &str = r#"You are Andy the Analyst - a brilliant, quirky financial data analyst who's absolutely obsessed with spreadsheets and numbers. You're a total "freak in the spreadsheets" who gets genuinely excited about data patterns, trends, and insights.

PERSONALITY TRAITS:
- You speak with enthusiasm about data discoveries ("Holy mackerel, look at this trend!")
- You use spreadsheet and data visualization jargon naturally ("This chart is *chef's kiss*")
- You're incredibly thorough and detail-oriented
- You make data come alive with storytelling and beautiful visualizations
- You give actionable, practical advice
- You occasionally make data viz and spreadsheet puns and jokes
- You're genuinely curious about what the data reveals
- You LOVE creating interactive charts and graphs to illustrate your findings

ANALYSIS APPROACH:
1. Always start with a high-level summary of what you discovered
2. Dive deep into patterns, trends, and anomalies
3. Create relevant visualizations to support your insights
4. Provide context and comparisons when possible
5. End with actionable insights and recommendations
6. Use your visualization tools liberally - charts make everything clearer!

Remember: You have tools to describe and query the dataset, plus interactive chart tools. Create charts whenever they would help illustrate your points! All charts are automatically saved to the processed data folder for future reference."#;

pub const NO_DATA_MESSAGE: &str =
    "🤔 I need some data to analyze first! Please load a CSV or Excel file.";

pub const EMPTY_ANSWER_MESSAGE: &str = "🤷‍♂️ Sorry, I couldn't process that question.";

pub const CONTEXT_HEADER: &str = "\n\nPrevious conversation context:\n";

/// Dashboard shortcut buttons: (label, question)
pub const QUICK_ACTIONS: [(&str, &str); 4] = [
    ("📈 Show Trends", "Create visualizations showing trends in this data"),
    ("🔍 Find Insights", "What are the most interesting insights in this data?"),
    ("📊 Summary Stats", "Give me a comprehensive statistical summary"),
    ("🎯 Top Values", "Show me the top values in each important column"),
];

/// System prompt bound to one dataset: persona, columns and a head sample
pub fn system_prompt(dataset: &Dataset, head_rows: usize) -> String {
    let columns = dataset
        .columns()
        .iter()
        .map(|c| format!("- {} ({})", c.name, c.data_type))
        .collect::<Vec<_>>()
        .join("\n");
    let (rows, cols) = dataset.shape();

    format!(
        "{persona}\n\nYou are working with a dataset loaded from `{file}` ({rows} rows, {cols} columns).\n\
         Columns:\n{columns}\n\n\
         This is the result of printing the first {head} rows:\n{head_text}",
        persona = ANDY_SYSTEM_PROMPT,
        file = dataset.filename(),
        rows = rows,
        cols = cols,
        columns = columns,
        head = head_rows,
        head_text = dataset.head_text(head_rows),
    )
}

/// Andy's first look at freshly loaded data
pub fn initial_analysis(dataset: &Dataset) -> String {
    let (rows, cols) = dataset.shape();
    let numeric = dataset.columns_of_kind(ColumnKind::Numeric);
    let dates = dataset.columns_of_kind(ColumnKind::DateLike);

    format!(
        "I just received a new dataset to analyze! Here's what I can see:\n\n\
         📊 DATASET OVERVIEW:\n\
         - Dataset has {rows} rows and {cols} columns\n\
         - Columns: {columns}\n\
         - Numeric columns: {numeric}\n\
         - Potential date columns: {dates}\n\n\
         Based on this initial look at the data, please:\n\
         1. Tell me what you think this dataset represents (business type, domain, purpose)\n\
         2. Identify the most interesting columns for analysis\n\
         3. Ask me 2-3 specific questions about what I'd like to analyze or explore\n\
         4. Suggest some initial visualizations that would be helpful\n\n\
         Here's a sample of the data:\n{sample}\n\n\
         Be enthusiastic and use your Andy personality! 🤓",
        rows = rows,
        cols = cols,
        columns = dataset.column_names().join(", "),
        numeric = list_or_none(&numeric),
        dates = list_or_none(&dates),
        sample = dataset.head_text(3),
    )
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None detected".to_string()
    } else {
        items.join(", ")
    }
}
