use clap::Parser;

use crate::app::AppOptions;

#[derive(Parser, Debug)]
#[command(version, about = "Fetch financial news and summarize it with an LLM", long_about = None)]
pub struct Args {
    #[arg(long, help = "Prefill the query box")]
    pub query: Option<String>,

    #[arg(short = 'n', long, help = "Initial max articles (5-100, step 5)")]
    pub max_articles: Option<u32>,

    #[arg(long, help = "Show the session state dump in the developer panel")]
    pub debug: bool,
}

impl From<Args> for AppOptions {
    fn from(a: Args) -> Self {
        AppOptions {
            query: a.query,
            max_articles: a.max_articles,
            debug: a.debug,
        }
    }
}
