//! Batched persistence coordinator.
//!
//! Groups rendered tiles into fixed-size batches in generation order.
//! Each batch runs two branches concurrently and joins both before the
//! next batch starts:
//!
//! 1. tile uploads to object storage, with parallelism bounded by the
//!    batch size;
//! 2. the bookkeeping pair: bulk tile registration plus the
//!    `total_images` counter increment.
//!
//! Any failure inside a batch aborts the run; there is no partial-batch
//! retry.

use futures::{StreamExt, TryStreamExt};

use satseg_core::error::CoreError;
use satseg_core::types::DbId;
use satseg_storage::ObjectStore;

use crate::render::RenderedTile;
use crate::stores::ProjectStore;
use crate::PipelineError;

/// Persist a lazily produced tile stream for one project.
///
/// `start_index` is the project's tile counter before this run; tiles
/// receive consecutive indices from there. The destination container is
/// created lazily before the first upload. Returns the number of tiles
/// persisted.
#[allow(clippy::too_many_arguments)]
pub async fn persist_tiles<P, O>(
    projects: &P,
    objects: &O,
    container: &str,
    project_id: DbId,
    start_index: i64,
    class_count: usize,
    batch_size: usize,
    tiles: impl Iterator<Item = Result<RenderedTile, PipelineError>>,
) -> Result<i64, PipelineError>
where
    P: ProjectStore + ?Sized,
    O: ObjectStore + ?Sized,
{
    if batch_size == 0 {
        return Err(CoreError::Validation(
            "Upload batch size must be greater than zero".to_string(),
        )
        .into());
    }

    let mut next_index = start_index;
    let mut container_ready = false;
    let mut batch: Vec<RenderedTile> = Vec::with_capacity(batch_size);

    for tile in tiles {
        batch.push(tile?);
        if batch.len() == batch_size {
            if !container_ready {
                objects.ensure_container(container).await?;
                container_ready = true;
            }
            let count = flush_batch(
                projects,
                objects,
                container,
                project_id,
                next_index,
                class_count,
                batch_size,
                std::mem::take(&mut batch),
            )
            .await?;
            next_index += count;
        }
    }

    // Flush the final partial batch once the tile stream ends.
    if !batch.is_empty() {
        if !container_ready {
            objects.ensure_container(container).await?;
        }
        let count = flush_batch(
            projects,
            objects,
            container,
            project_id,
            next_index,
            class_count,
            batch_size,
            batch,
        )
        .await?;
        next_index += count;
    }

    Ok(next_index - start_index)
}

/// Flush one batch: uploads and bookkeeping run concurrently, both must
/// succeed.
#[allow(clippy::too_many_arguments)]
async fn flush_batch<P, O>(
    projects: &P,
    objects: &O,
    container: &str,
    project_id: DbId,
    start_index: i64,
    class_count: usize,
    batch_size: usize,
    batch: Vec<RenderedTile>,
) -> Result<i64, PipelineError>
where
    P: ProjectStore + ?Sized,
    O: ObjectStore + ?Sized,
{
    let count = batch.len() as i64;

    let uploads = async {
        futures::stream::iter(batch.into_iter().map(|tile| {
            let path = format!("{project_id}/{}", tile.file_name);
            async move {
                objects
                    .upload_object(container, &path, tile.bytes)
                    .await
                    .map_err(PipelineError::from)
            }
        }))
        .buffer_unordered(batch_size)
        .try_collect::<Vec<()>>()
        .await?;
        Ok::<_, PipelineError>(())
    };

    let bookkeeping = async {
        tokio::try_join!(
            projects.register_tiles(project_id, start_index, start_index + count, class_count),
            projects.increment_total_images(project_id, count),
        )?;
        Ok::<_, PipelineError>(())
    };

    tokio::try_join!(uploads, bookkeeping)?;
    tracing::debug!(project_id, start_index, count, "Flushed tile batch");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use satseg_storage::{MemoryObjectStore, StorageError};

    use crate::stores::MemoryProjectStore;

    fn tiles(count: usize) -> impl Iterator<Item = Result<RenderedTile, PipelineError>> {
        (0..count).map(|i| {
            Ok(RenderedTile {
                file_name: format!("img_{i}.png"),
                bytes: vec![i as u8],
            })
        })
    }

    #[tokio::test]
    async fn sixty_five_tiles_flush_in_three_batches() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 2).await;
        let objects = MemoryObjectStore::new();

        let persisted = persist_tiles(&projects, &objects, "tiles", 1, 0, 2, 30, tiles(65))
            .await
            .unwrap();

        assert_eq!(persisted, 65);
        let project = projects.project(1).await.unwrap();
        assert_eq!(project.total_images, 65);
        assert_eq!(
            project.registered_ranges,
            vec![(0, 30), (30, 60), (60, 65)]
        );
        assert_eq!(project.tiles.len(), 65);
        assert_eq!(objects.object_names("tiles").await.len(), 65);
    }

    #[tokio::test]
    async fn indices_continue_from_start_index() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 0).await;
        projects.increment_total_images(1, 10).await.unwrap();
        let objects = MemoryObjectStore::new();

        persist_tiles(&projects, &objects, "tiles", 1, 10, 0, 4, tiles(6))
            .await
            .unwrap();

        let project = projects.project(1).await.unwrap();
        assert_eq!(project.registered_ranges, vec![(10, 14), (14, 16)]);
        assert_eq!(project.total_images, 16);
        assert_eq!(*project.tiles.first().unwrap(), 10);
        assert_eq!(*project.tiles.last().unwrap(), 15);
    }

    #[tokio::test]
    async fn container_is_created_lazily() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 1).await;
        let objects = MemoryObjectStore::new();
        assert!(!objects.container_exists("tiles").await.unwrap());

        persist_tiles(&projects, &objects, "tiles", 1, 0, 1, 30, tiles(3))
            .await
            .unwrap();

        assert!(objects.container_exists("tiles").await.unwrap());
    }

    #[tokio::test]
    async fn empty_stream_persists_nothing() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 1).await;
        let objects = MemoryObjectStore::new();

        let persisted = persist_tiles(&projects, &objects, "tiles", 1, 0, 1, 30, tiles(0))
            .await
            .unwrap();

        assert_eq!(persisted, 0);
        assert_eq!(projects.project(1).await.unwrap().total_images, 0);
        // No upload means no lazy container creation either.
        assert!(!objects.container_exists("tiles").await.unwrap());
    }

    #[tokio::test]
    async fn tile_objects_are_keyed_by_project() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(7, 1).await;
        let objects = MemoryObjectStore::new();

        persist_tiles(&projects, &objects, "tiles", 7, 0, 1, 30, tiles(2))
            .await
            .unwrap();

        assert_eq!(
            objects.object_names("tiles").await,
            vec!["7/img_0.png", "7/img_1.png"]
        );
    }

    #[tokio::test]
    async fn render_error_aborts_the_run() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 1).await;
        let objects = MemoryObjectStore::new();

        let stream = (0..5).map(|i| {
            if i == 3 {
                Err(PipelineError::Core(CoreError::Validation(
                    "bad tile".to_string(),
                )))
            } else {
                Ok(RenderedTile {
                    file_name: format!("img_{i}.png"),
                    bytes: vec![],
                })
            }
        });

        let result = persist_tiles(&projects, &objects, "tiles", 1, 0, 1, 30, stream).await;
        assert!(result.is_err());
        // The failing batch never flushed.
        assert_eq!(projects.project(1).await.unwrap().total_images, 0);
    }

    /// Object store whose uploads always fail.
    struct BrokenUploads;

    #[async_trait]
    impl ObjectStore for BrokenUploads {
        async fn container_exists(&self, _container: &str) -> Result<bool, StorageError> {
            Ok(true)
        }
        async fn create_container(&self, _container: &str) -> Result<(), StorageError> {
            Ok(())
        }
        async fn upload_object(
            &self,
            _container: &str,
            _path: &str,
            _bytes: Vec<u8>,
        ) -> Result<(), StorageError> {
            Err(StorageError::Transport("upload refused".to_string()))
        }
        async fn download_object(
            &self,
            _container: &str,
            _path: &str,
        ) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound("nothing here".to_string()))
        }
    }

    #[tokio::test]
    async fn upload_failure_fails_the_batch() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 1).await;

        let result = persist_tiles(&projects, &BrokenUploads, "tiles", 1, 0, 1, 30, tiles(3)).await;
        assert!(matches!(
            result,
            Err(PipelineError::Storage(StorageError::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 1).await;
        let objects = MemoryObjectStore::new();

        let result = persist_tiles(&projects, &objects, "tiles", 1, 0, 1, 0, tiles(3)).await;
        assert!(matches!(
            result,
            Err(PipelineError::Core(CoreError::Validation(_)))
        ));
    }
}
