use super::{
    IMAGE_TYPE_PREFIX, IngestError, MAX_UPLOAD_BYTES, SNIFF_LEN, StoredAsset, naming, public_url,
    sniff_content_type,
};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{error, info, warn};

/// The file part of an upload request.
pub struct Upload<R> {
    pub filename: String,
    pub reader: R,
}

impl<R> Upload<R> {
    pub fn new(filename: impl Into<String>, reader: R) -> Self {
        Self {
            filename: filename.into(),
            reader,
        }
    }
}

/// Validates uploads and writes accepted ones into the storage directory.
///
/// Holds no mutable state; concurrent ingestions only share the directory namespace.
#[derive(Debug, Clone)]
pub struct IngestionService {
    upload_directory: PathBuf,
}

impl IngestionService {
    pub fn new(upload_directory: PathBuf) -> Self {
        Self { upload_directory }
    }

    /// Runs the checks in order (size, presence, content) and stores the file.
    ///
    /// `declared_size` is the client's claim about the whole request and is only used
    /// for the early size check; the returned size comes from the written file.
    pub async fn ingest<R>(
        &self,
        declared_size: Option<u64>,
        upload: Option<Upload<R>>,
    ) -> Result<StoredAsset, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let result = self.try_ingest(declared_size, upload).await;
        match &result {
            Ok(asset) => info!(
                name = %asset.name,
                size = asset.size,
                mime = %asset.content_type,
                "Stored upload"
            ),
            Err(IngestError::Storage(e)) => error!("Failed to store upload: {}", e),
            Err(e) => warn!("Rejected upload: {}", e),
        }
        result
    }

    async fn try_ingest<R>(
        &self,
        declared_size: Option<u64>,
        upload: Option<Upload<R>>,
    ) -> Result<StoredAsset, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        if declared_size.is_some_and(|size| size > MAX_UPLOAD_BYTES) {
            return Err(IngestError::TooLarge);
        }

        let Upload {
            filename,
            mut reader,
        } = upload.ok_or(IngestError::MissingFile)?;

        let mut prefix = Vec::with_capacity(SNIFF_LEN);
        (&mut reader)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut prefix)
            .await
            .map_err(|e| {
                warn!("Could not read upload prefix: {}", e);
                IngestError::InvalidFileType
            })?;

        let content_type = sniff_content_type(&prefix);
        if !content_type.starts_with(IMAGE_TYPE_PREFIX) {
            return Err(IngestError::InvalidFileType);
        }

        let storage_name =
            naming::with_image_extension(naming::allocate_storage_name(&filename), content_type)
                .ok_or(IngestError::InvalidFileType)?;
        let target = self.upload_directory.join(&storage_name);

        // A failed copy leaves whatever was written in place
        let mut file = tokio::fs::File::create(&target).await?;
        let mut body = (&prefix[..]).chain(reader).take(MAX_UPLOAD_BYTES + 1);
        let copied = tokio::io::copy(&mut body, &mut file).await?;
        file.flush().await?;
        drop(file);

        if copied > MAX_UPLOAD_BYTES {
            if let Err(e) = tokio::fs::remove_file(&target).await {
                warn!("Could not remove oversized upload {:?}: {}", target, e);
            }
            return Err(IngestError::TooLarge);
        }

        let size = tokio::fs::metadata(&target).await?.len();

        Ok(StoredAsset {
            url: public_url(&storage_name),
            name: storage_name,
            size,
            content_type: content_type.to_string(),
        })
    }
}
