// Phase 10: 全ジョブ実行

use rayon::prelude::*;
use tracing::info;

use crate::pipeline::job_runner::{JobConfig, JobResult, extract_job};
use crate::store::RecordSink;

/// Build the worker pool. `workers == 0` keeps rayon's default size.
fn build_pool(workers: usize) -> crate::error::Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if workers > 0 {
        builder = builder.num_threads(workers);
    }
    Ok(builder.build()?)
}

/// Extract all jobs in parallel. Results keep the input order.
/// One job failure does NOT prevent other jobs from running.
pub fn extract_all_jobs(
    jobs: &[JobConfig],
    workers: usize,
) -> crate::error::Result<Vec<crate::error::Result<JobResult>>> {
    let pool = build_pool(workers)?;
    info!(jobs = jobs.len(), threads = pool.current_num_threads(), "extracting");
    Ok(pool.install(|| jobs.par_iter().map(extract_job).collect()))
}

/// Extract all jobs in parallel, then hand each record to `sink` in input order.
///
/// Persistence is sequential: a sink error fails only its own job.
pub fn run_all_jobs(
    jobs: &[JobConfig],
    sink: &mut dyn RecordSink,
    workers: usize,
) -> crate::error::Result<Vec<crate::error::Result<JobResult>>> {
    let extracted = extract_all_jobs(jobs, workers)?;
    Ok(extracted
        .into_iter()
        .map(|result| -> crate::error::Result<JobResult> {
            let job = result?;
            sink.insert_record(&job.record)?;
            Ok(job)
        })
        .collect())
}
