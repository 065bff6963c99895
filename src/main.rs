use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info};

use jobcache::app::AppStores;
use jobcache::cache::{EntityId, FetchOutcome, Pagination};
use jobcache::config::Config;
use jobcache::logging;
use jobcache::marketplace::filters::{
  ApplicationFilter, AppliedJobFilter, BusinessJobFilter, ConversationFilter, InterviewFilter,
  JobFilter,
};
use jobcache::marketplace::MarketplaceClient;

#[derive(Parser, Debug)]
#[command(name = "jobcache")]
#[command(about = "Browse a job marketplace through its client-side cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jobcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Marketplace API base URL, overrides the config file
  #[arg(long)]
  api_url: Option<String>,

  /// Log to stderr instead of the log file
  #[arg(long)]
  log_stderr: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Search job listings
  Jobs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long = "location")]
    locations: Vec<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long, default_value_t = 1)]
    pages: u32,
  },
  /// Jobs posted by the configured business
  BusinessJobs {
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long, default_value_t = 1)]
    pages: u32,
  },
  /// Most applied and most viewed jobs of the configured business
  Popular,
  /// Applications received for a job
  Applications {
    #[arg(long)]
    job: EntityId,
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long, default_value_t = 1)]
    pages: u32,
  },
  /// Jobs you applied to
  Applied,
  /// Your favorite jobs
  Favorites,
  /// Jobs recommended for you
  Recommendations,
  Interviews {
    #[arg(long = "status")]
    statuses: Vec<String>,
  },
  Conversations {
    #[arg(long)]
    unread: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.log_stderr)?;

  let config = load_config(&args)?;
  let client = MarketplaceClient::new(&config)?;
  let stores = AppStores::new(&config, client);

  info!(command = ?args.command, "running");
  run(&stores, &config, args.command).await
}

fn load_config(args: &Args) -> Result<Config> {
  let loaded = Config::try_load(args.config.as_deref())?;
  match (loaded, &args.api_url) {
    (Some(config), Some(url)) => Ok(Config {
      api: jobcache::config::ApiConfig {
        base_url: url.clone(),
        ..config.api
      },
      ..config
    }),
    (Some(config), None) => Ok(config),
    (None, Some(url)) => Ok(Config::with_base_url(url.clone())),
    (None, None) => Config::load(None),
  }
}

async fn run(stores: &AppStores, config: &Config, command: Command) -> Result<()> {
  match command {
    Command::Jobs {
      search,
      locations,
      tags,
      pages,
    } => {
      let filter = JobFilter {
        search: search.unwrap_or_default(),
        locations,
        tags,
        ..Default::default()
      };
      let jobs = &stores.user_jobs;
      let filter = &filter;
      load_pages("jobs", pages, move |page| jobs.fetch_jobs_for_filter(filter, page)).await?;

      let items = jobs.jobs(filter).unwrap_or_default();
      for job in &items {
        println!(
          "{:>8}  {}  @ {}  [{}]  {} applications",
          job.id,
          job.title,
          job.company_name,
          job.location.as_deref().unwrap_or("-"),
          jobs.application_count(job.id)
        );
      }
      summary(items.len(), jobs.total_jobs(filter), jobs.jobs_pagination(filter));
    }

    Command::BusinessJobs { statuses, pages } => {
      let business_id = require_business(config)?;
      let filter = BusinessJobFilter {
        statuses: parse_all(&statuses)?,
        ..Default::default()
      };
      let jobs = &stores.business_jobs;
      let filter = &filter;
      load_pages("business jobs", pages, move |page| {
        jobs.fetch_jobs_for_business_and_filter(business_id, filter, page)
      })
      .await?;

      let items = jobs.jobs(business_id, filter).unwrap_or_default();
      for job in &items {
        println!(
          "{:>8}  {:<8}  {}  {} applications ({} pending)  {} interviews  {} views",
          job.id,
          job.status,
          job.title,
          jobs.application_count(job.id),
          jobs.pending_applications(job.id),
          jobs.interview_count(job.id),
          jobs.total_views(job.id)
        );
      }
      summary(
        items.len(),
        jobs.total_jobs(business_id, filter),
        jobs.jobs_pagination(business_id, filter),
      );
    }

    Command::Popular => {
      require_business(config)?;
      let jobs = &stores.business_jobs;
      if jobs.fetch_most_popular().await == FetchOutcome::Failed && !jobs.has_valid_popular_cache() {
        return Err(eyre!("Failed to load popular jobs (details in the log)"));
      }

      println!("Most applied:");
      for job in jobs.most_applied_jobs() {
        println!("{:>8}  {}  {} applications", job.id, job.title, job.application_count);
      }
      println!("Most viewed:");
      for job in jobs.most_viewed_jobs() {
        println!("{:>8}  {}  {} views", job.id, job.title, job.view_count);
      }
    }

    Command::Applications {
      job,
      statuses,
      pages,
    } => {
      let filter = ApplicationFilter {
        statuses: parse_all(&statuses)?,
        ..Default::default()
      };
      let apps = &stores.applications;
      let filter = &filter;
      load_pages("applications", pages, move |page| {
        apps.fetch_applications_for_job_and_filter(job, filter, page)
      })
      .await?;

      let items = apps.applications(job, filter).unwrap_or_default();
      for app in &items {
        let star = if apps.is_candidate_shortlisted(job, app.candidate_id) {
          "*"
        } else {
          " "
        };
        println!("{:>8} {} {:<11}  {}", app.id, star, app.status, app.candidate_name);
      }
      summary(
        items.len(),
        apps.total_applications(job, filter),
        apps.applications_pagination(job, filter),
      );
    }

    Command::Applied => {
      let filter = AppliedJobFilter::default();
      let jobs = &stores.user_jobs;
      let filter = &filter;
      load_pages("applied jobs", 1, move |page| jobs.fetch_applied_jobs(filter, page)).await?;

      let items = jobs.applied_jobs(filter).unwrap_or_default();
      for applied in &items {
        println!(
          "{:>8}  {:<11}  {} @ {}",
          applied.job_id, applied.status, applied.title, applied.company_name
        );
      }
      println!("{} shown, {} total", items.len(), jobs.total_applied(filter));
    }

    Command::Favorites => {
      let jobs = &stores.user_jobs;
      load_pages("favorites", 1, move |page| jobs.fetch_favorites(page)).await?;

      let items = jobs.favorites().unwrap_or_default();
      for job in &items {
        println!("{:>8}  {}  @ {}", job.id, job.title, job.company_name);
      }
      println!("{} favorites", items.len());
    }

    Command::Recommendations => {
      let jobs = &stores.user_jobs;
      if jobs.fetch_recommendations().await == FetchOutcome::Failed
        && !jobs.has_valid_recommendations_cache()
      {
        return Err(eyre!("Failed to load recommendations (details in the log)"));
      }
      for job in jobs.recommendations() {
        println!("{:>8}  {}  @ {}", job.id, job.title, job.company_name);
      }
    }

    Command::Interviews { statuses } => {
      let filter = InterviewFilter {
        statuses: parse_all(&statuses)?,
        ..Default::default()
      };
      let interviews = &stores.interviews;
      let filter = &filter;
      load_pages("interviews", 1, move |page| interviews.fetch_interviews(filter, page)).await?;

      let items = interviews.interviews(filter).unwrap_or_default();
      for interview in &items {
        println!(
          "{:>8}  {}  {:<11}  {} for {}",
          interview.id,
          interview.scheduled_at.format("%Y-%m-%d %H:%M"),
          interview.status,
          interview.candidate_name,
          interview.job_title
        );
      }
      summary(
        items.len(),
        interviews.total_interviews(filter),
        interviews.interviews_pagination(filter),
      );
    }

    Command::Conversations { unread } => {
      let filter = ConversationFilter {
        unread_only: unread,
        ..Default::default()
      };
      let conversations = &stores.conversations;
      let filter = &filter;
      load_pages("conversations", 1, move |page| {
        conversations.fetch_conversations(filter, page)
      })
      .await?;

      let items = conversations.conversations(filter).unwrap_or_default();
      for conversation in &items {
        println!(
          "{:>8}  ({:>2})  {}: {}",
          conversation.id,
          conversation.unread_count,
          conversation.participant_name,
          conversation.last_message.as_deref().unwrap_or("")
        );
      }
      println!(
        "{} shown, {} total, {} unread",
        items.len(),
        conversations.total_conversations(filter),
        conversations.total_unread()
      );
    }
  }

  Ok(())
}

/// Load up to `pages` pages, stopping early when the server has no more.
async fn load_pages<F, Fut>(what: &str, pages: u32, mut fetch: F) -> Result<()>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = FetchOutcome>,
{
  for page in 0..pages.max(1) {
    match fetch(page).await {
      FetchOutcome::Loaded { has_more: true, .. } => continue,
      FetchOutcome::Failed if page == 0 => {
        return Err(eyre!("Failed to load {} (details in the log)", what));
      }
      outcome => {
        debug!(what, page, ?outcome, "stopped paging");
        break;
      }
    }
  }
  Ok(())
}

fn summary(shown: usize, total: u64, pagination: Pagination) {
  println!(
    "{} shown, {} total, has_more={}",
    shown, total, pagination.has_more
  );
}

fn require_business(config: &Config) -> Result<EntityId> {
  config
    .business_id
    .ok_or_else(|| eyre!("Set business_id in the config file to use business commands"))
}

fn parse_all<S: std::str::FromStr<Err = color_eyre::Report>>(raw: &[String]) -> Result<Vec<S>> {
  raw.iter().map(|s| s.parse()).collect()
}
