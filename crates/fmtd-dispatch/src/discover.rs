use rand::Rng;

use fmtd_common::protocol::error::Result;
use fmtd_directory::Directory;

/// Picks the address of one live worker, uniformly at random.
///
/// Returns `Ok(None)` when the snapshot is empty; a directory communication
/// error propagates to the caller (who logs it and treats it as "none
/// available") and is not retried here.
///
/// Uniform random is intentionally the simplest possible policy. The seam is
/// snapshot-in, one-address-out, so a metrics-aware policy can replace this
/// without touching the interface.
pub async fn select_worker(directory: &dyn Directory, namespace: &str) -> Result<Option<String>> {
    let entries = directory.list(namespace).await?;

    if entries.is_empty() {
        return Ok(None);
    }

    let index = rand::thread_rng().gen_range(0..entries.len());
    Ok(entries.into_iter().nth(index).map(|e| e.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmtd_directory::MemoryDirectory;
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_empty_namespace_selects_none() {
        let dir = MemoryDirectory::new();
        assert_eq!(select_worker(&dir, "/workers/").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_entry_always_selected() {
        let dir = MemoryDirectory::new();
        dir.put("/workers/1", "10.0.0.1:9000", Duration::from_secs(10))
            .await
            .unwrap();

        for _ in 0..10 {
            assert_eq!(
                select_worker(&dir, "/workers/").await.unwrap().as_deref(),
                Some("10.0.0.1:9000")
            );
        }
    }

    #[tokio::test]
    async fn test_selection_is_roughly_uniform() {
        let dir = MemoryDirectory::new();
        let k = 4;
        for i in 0..k {
            dir.put(
                &format!("/workers/{}", i),
                &format!("10.0.0.{}:9000", i),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        }

        let draws = 4000;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..draws {
            let addr = select_worker(&dir, "/workers/").await.unwrap().unwrap();
            *counts.entry(addr).or_default() += 1;
        }

        assert_eq!(counts.len(), k, "every entry should be selected");
        for (addr, count) in counts {
            let freq = f64::from(count) / f64::from(draws as u32);
            // 1/K = 0.25; a binomial this size stays well inside these bounds.
            assert!(
                (0.15..=0.35).contains(&freq),
                "{} selected with frequency {}",
                addr,
                freq
            );
        }
    }
}
