//! Pipeline driver.
//!
//! Sequences one ingestion run: download each staged original, validate
//! it, plan and render its tiles, persist them in batches, provision
//! the training pod on the project's first-ever upload, and move the
//! project status forward. Files are processed strictly sequentially.
//!
//! Rollback is status-level only: any error sets the project back to
//! DRAFT and stops the remaining files, but tiles and counter
//! increments from batches that already flushed are kept. That matches
//! the observed behaviour of the system this replaces and is a known
//! best-effort gap, not an oversight.

use std::sync::Arc;

use image::GenericImageView;

use satseg_core::config::IngestConfig;
use satseg_core::error::CoreError;
use satseg_core::project::ProjectStatus;
use satseg_core::tiling::plan_tiles;
use satseg_core::types::DbId;
use satseg_pod::PodOrchestrator;
use satseg_storage::{ObjectStore, StorageSettings};

use crate::coordinator::persist_tiles;
use crate::render::{decode_source, TileRenderer};
use crate::stores::ProjectStore;
use crate::PipelineError;

/// Drives tile ingestion for staged image files.
pub struct IngestPipeline<P: ProjectStore> {
    projects: P,
    objects: Arc<dyn ObjectStore>,
    orchestrator: Arc<PodOrchestrator>,
    config: IngestConfig,
    /// Container holding user-staged originals.
    original_container: String,
    /// Container receiving produced tiles.
    public_container: String,
}

impl<P: ProjectStore> IngestPipeline<P> {
    pub fn new(
        projects: P,
        objects: Arc<dyn ObjectStore>,
        orchestrator: Arc<PodOrchestrator>,
        config: IngestConfig,
        storage: &StorageSettings,
    ) -> Self {
        Self {
            projects,
            objects,
            orchestrator,
            config,
            original_container: storage.original_container.clone(),
            public_container: storage.public_container.clone(),
        }
    }

    /// Split every staged file into tiles and persist them.
    ///
    /// On any failure the project status is rolled back to DRAFT and
    /// the original error is returned; remaining files are skipped.
    pub async fn split_and_upload_images(
        &self,
        project_id: DbId,
        file_names: &[String],
    ) -> Result<(), PipelineError> {
        match self.run(project_id, file_names).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::error!(
                    project_id,
                    error = %error,
                    "Ingestion failed, rolling back project status",
                );
                if let Err(rollback) = self
                    .projects
                    .set_status(project_id, ProjectStatus::Draft)
                    .await
                {
                    tracing::error!(project_id, error = %rollback, "Status rollback failed");
                }
                Err(error)
            }
        }
    }

    async fn run(&self, project_id: DbId, file_names: &[String]) -> Result<(), PipelineError> {
        self.projects
            .set_status(project_id, ProjectStatus::Uploading)
            .await?;

        for file_name in file_names {
            self.ingest_file(project_id, file_name).await?;
        }
        Ok(())
    }

    async fn ingest_file(&self, project_id: DbId, file_name: &str) -> Result<(), PipelineError> {
        tracing::info!(project_id, file_name, "Downloading staged image");
        let bytes = self
            .objects
            .download_object(
                &self.original_container,
                &format!("{project_id}/{file_name}"),
            )
            .await?;

        if bytes.len() as u64 > self.config.image_byte_limit {
            return Err(CoreError::Validation(format!(
                "Image {file_name} exceeds the {} byte limit",
                self.config.image_byte_limit
            ))
            .into());
        }

        // Decoded pixels are scoped to this file; dropped on every exit
        // path before the next file starts.
        let source = decode_source(&bytes)?;
        let (width, height) = (source.width(), source.height());
        if u64::from(width) * u64::from(height) > self.config.image_pixel_limit {
            return Err(CoreError::Validation(format!(
                "Image {file_name} ({width}x{height}) exceeds the {} pixel limit",
                self.config.image_pixel_limit
            ))
            .into());
        }

        let project = self
            .projects
            .fetch_project(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })?;
        let start_index = project.total_images;

        let plan = plan_tiles(width, height, self.config.tile_size, file_name)?;
        tracing::info!(
            project_id,
            file_name,
            rows = plan.num_rows,
            columns = plan.num_columns,
            "Planned tile grid",
        );

        let renderer = TileRenderer::new(&source, self.config.tile_size);
        let tiles = plan.entries.iter().map(|entry| renderer.render(entry));

        let persisted = persist_tiles(
            &self.projects,
            self.objects.as_ref(),
            &self.public_container,
            project_id,
            start_index,
            project.annotation_class_count,
            self.config.upload_batch_size,
            tiles,
        )
        .await?;

        // First-ever successful upload for this project stands up the
        // training pod.
        if start_index == 0 {
            tracing::info!(project_id, "First upload complete, provisioning training pod");
            self.orchestrator
                .create_or_update_pod(&project_id.to_string(), &[])
                .await?;
        }

        self.projects
            .set_status(project_id, ProjectStatus::InProgress)
            .await?;
        tracing::info!(project_id, file_name, tiles = persisted, "Split and upload complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    use satseg_pod::{EnvVar, ExecEvent, Pod, PodApiError, PodPhase, PodPlatform, RetryConfig};
    use satseg_storage::MemoryObjectStore;

    use crate::stores::MemoryProjectStore;

    /// Platform double that records creations and reports every pod as
    /// absent.
    #[derive(Default)]
    struct RecordingPlatform {
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PodPlatform for RecordingPlatform {
        async fn get_pod(&self, _name: &str) -> Result<Option<Pod>, PodApiError> {
            Ok(None)
        }

        async fn create_pod(
            &self,
            name: &str,
            _project_id: &str,
            _extra_env: &[EnvVar],
        ) -> Result<Pod, PodApiError> {
            self.created.lock().unwrap().push(name.to_string());
            Ok(serde_json::from_value(serde_json::json!({
                "metadata": { "name": name },
                "status": { "phase": PodPhase::Pending },
            }))
            .unwrap())
        }

        async fn delete_pod(&self, _name: &str) -> Result<(), PodApiError> {
            Ok(())
        }

        async fn exec(
            &self,
            _name: &str,
            _command: &[String],
            _on_event: &(dyn Fn(ExecEvent) + Send + Sync),
        ) -> Result<(), PodApiError> {
            Ok(())
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([10, 20, 30, 255]),
        ));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn storage_settings() -> StorageSettings {
        StorageSettings {
            original_container: "original".to_string(),
            public_container: "public".to_string(),
            dataset_container: "dataset".to_string(),
            import_model_container: "import".to_string(),
            export_model_container: "export".to_string(),
            endpoint_url: None,
        }
    }

    struct Harness {
        pipeline: IngestPipeline<MemoryProjectStore>,
        objects: Arc<MemoryObjectStore>,
        platform: Arc<RecordingPlatform>,
    }

    async fn harness(config: IngestConfig) -> Harness {
        let projects = MemoryProjectStore::new();
        projects.seed_project(1, 2).await;

        let objects = Arc::new(MemoryObjectStore::new());
        objects.seed("original", "1/img.png", png_bytes(600, 400)).await;

        let platform = Arc::new(RecordingPlatform::default());
        let orchestrator = Arc::new(PodOrchestrator::new(
            Arc::clone(&platform) as Arc<dyn PodPlatform>,
            RetryConfig::default(),
        ));

        let pipeline = IngestPipeline::new(
            projects,
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
            orchestrator,
            config,
            &storage_settings(),
        );

        Harness {
            pipeline,
            objects,
            platform,
        }
    }

    fn projects(harness: &Harness) -> &MemoryProjectStore {
        &harness.pipeline.projects
    }

    #[tokio::test]
    async fn full_run_persists_tiles_and_moves_status_forward() {
        let harness = harness(IngestConfig::default()).await;

        harness
            .pipeline
            .split_and_upload_images(1, &["img.png".to_string()])
            .await
            .unwrap();

        let project = projects(&harness).project(1).await.unwrap();
        // 600x400 at 256 -> 2 rows x 3 columns.
        assert_eq!(project.total_images, 6);
        assert_eq!(project.tiles.len(), 6);
        assert_eq!(project.status, ProjectStatus::InProgress);

        let names = harness.objects.object_names("public").await;
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"1/img_0_0.png".to_string()));
        assert!(names.contains(&"1/img_1_2.png".to_string()));
    }

    #[tokio::test]
    async fn first_upload_provisions_the_pod_exactly_once() {
        let harness = harness(IngestConfig::default()).await;
        harness
            .objects
            .seed("original", "1/more.png", png_bytes(300, 300))
            .await;

        harness
            .pipeline
            .split_and_upload_images(1, &["img.png".to_string(), "more.png".to_string()])
            .await
            .unwrap();

        // Only the first file found total_images == 0.
        let created = harness.platform.created.lock().unwrap().clone();
        assert_eq!(created, vec!["sat-project-1"]);
    }

    #[tokio::test]
    async fn later_uploads_do_not_provision_again() {
        let harness = harness(IngestConfig::default()).await;

        harness
            .pipeline
            .split_and_upload_images(1, &["img.png".to_string()])
            .await
            .unwrap();
        harness
            .objects
            .seed("original", "1/again.png", png_bytes(128, 128))
            .await;
        harness
            .pipeline
            .split_and_upload_images(1, &["again.png".to_string()])
            .await
            .unwrap();

        assert_eq!(harness.platform.created.lock().unwrap().len(), 1);
        // Second file's tile continues the index sequence.
        let project = projects(&harness).project(1).await.unwrap();
        assert_eq!(project.total_images, 7);
    }

    #[tokio::test]
    async fn oversized_image_rolls_back_to_draft() {
        let config = IngestConfig {
            image_byte_limit: 16,
            ..IngestConfig::default()
        };
        let harness = harness(config).await;

        let err = harness
            .pipeline
            .split_and_upload_images(1, &["img.png".to_string()])
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
        let project = projects(&harness).project(1).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.total_images, 0);
    }

    #[tokio::test]
    async fn pixel_limit_violation_rolls_back_to_draft() {
        let config = IngestConfig {
            image_pixel_limit: 100 * 100,
            ..IngestConfig::default()
        };
        let harness = harness(config).await;

        let err = harness
            .pipeline
            .split_and_upload_images(1, &["img.png".to_string()])
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
        assert_eq!(
            projects(&harness).project(1).await.unwrap().status,
            ProjectStatus::Draft
        );
    }

    #[tokio::test]
    async fn undecodable_image_rolls_back_to_draft() {
        let harness = harness(IngestConfig::default()).await;
        harness
            .objects
            .seed("original", "1/junk.png", b"not an image at all".to_vec())
            .await;

        let err = harness
            .pipeline
            .split_and_upload_images(1, &["junk.png".to_string()])
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
        assert_eq!(
            projects(&harness).project(1).await.unwrap().status,
            ProjectStatus::Draft
        );
    }

    #[tokio::test]
    async fn missing_project_is_fatal() {
        let harness = harness(IngestConfig::default()).await;
        harness.objects.seed("original", "99/img.png", png_bytes(64, 64)).await;

        let err = harness
            .pipeline
            .split_and_upload_images(99, &["img.png".to_string()])
            .await
            .unwrap_err();

        // Project 99 was never seeded: the UPLOADING transition already
        // targets a missing document.
        assert_matches!(err, PipelineError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_staged_file_aborts_the_run() {
        let harness = harness(IngestConfig::default()).await;

        let err = harness
            .pipeline
            .split_and_upload_images(1, &["ghost.png".to_string()])
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Storage(_));
        assert_eq!(
            projects(&harness).project(1).await.unwrap().status,
            ProjectStatus::Draft
        );
    }

    #[tokio::test]
    async fn failure_mid_run_skips_remaining_files() {
        let harness = harness(IngestConfig::default()).await;
        // Second file is not staged; third would succeed but must never run.
        harness
            .objects
            .seed("original", "1/third.png", png_bytes(300, 300))
            .await;

        let err = harness
            .pipeline
            .split_and_upload_images(
                1,
                &[
                    "img.png".to_string(),
                    "missing.png".to_string(),
                    "third.png".to_string(),
                ],
            )
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Storage(_));
        let project = projects(&harness).project(1).await.unwrap();
        // Rolled back to DRAFT, but the first file's tiles are kept
        // (status-level rollback only).
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.total_images, 6);
        // third.png never produced tiles.
        assert_eq!(harness.objects.object_names("public").await.len(), 6);
    }
}
