use bytes::Bytes;
use log::debug;
use vmcore::audio::{AudioError, AudioSource};

/// Reads the bytes behind `source`, refusing anything over `max_bytes`.
pub async fn load_audio(source: &AudioSource, max_bytes: u64) -> Result<Bytes, AudioError> {
    match source {
        AudioSource::Memory(data) => {
            check_size(data.len() as u64, max_bytes)?;
            Ok(data.clone())
        }
        AudioSource::Path(path) => {
            let size = tokio::fs::metadata(path).await?.len();
            check_size(size, max_bytes)?;
            let data = tokio::fs::read(path).await?;
            debug!("Read {} bytes of audio from {}", data.len(), path.display());
            Ok(Bytes::from(data))
        }
    }
}

fn check_size(size: u64, limit: u64) -> Result<(), AudioError> {
    if size > limit {
        return Err(AudioError::TooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_from_memory_and_path() {
        let memory = AudioSource::from(vec![1u8, 2, 3]);
        assert_eq!(&load_audio(&memory, 10).await.unwrap()[..], &[1, 2, 3]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, [9u8; 16]).unwrap();
        let data = load_audio(&AudioSource::Path(path), 16).await.unwrap();
        assert_eq!(data.len(), 16);
    }

    #[tokio::test]
    async fn test_size_limit() {
        let memory = AudioSource::from(vec![0u8; 11]);
        assert!(matches!(
            load_audio(&memory, 10).await,
            Err(AudioError::TooLarge { size: 11, limit: 10 })
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = AudioSource::Path("/nonexistent/clip.ogg".into());
        assert!(matches!(
            load_audio(&source, 10).await,
            Err(AudioError::Io(_))
        ));
    }
}
