//! Accelerated bulk reads over Arrow IPC.
//!
//! The bulk-read service streams query results as an Arrow IPC stream, which
//! is considerably faster than paging row JSON through the REST API for large
//! results. The [`BulkReadClient`] itself has no close operation; its
//! [`TransportChannel`] owns the underlying HTTP transport and is what gets
//! released.

use std::fmt;
use std::io::{BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use arrow::ipc::reader::StreamReader;
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use url::Url;

use crate::client::join_path;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Transport channel carrying bulk-read streams.
pub struct TransportChannel {
    endpoint: Url,
    api_key: String,
    http: reqwest::blocking::Client,
    closed: AtomicBool,
}

impl TransportChannel {
    fn open(endpoint: Url, api_key: String, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            http,
            closed: AtomicBool::new(false),
        })
    }

    /// Release the channel. Further reads fail with [`Error::ChannelClosed`],
    /// as does closing a channel twice.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(Error::ChannelClosed);
        }
        Ok(())
    }

    /// Whether [`TransportChannel::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn get_stream(&self, session_id: &str) -> Result<reqwest::blocking::Response> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        let url = join_path(&self.endpoint, &format!("v1/read/{session_id}"))?;
        let response = self.http.get(url).bearer_auth(&self.api_key).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

impl fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportChannel")
            .field("endpoint", &self.endpoint.as_str())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Client for the accelerated bulk-read service.
///
/// Created from the same configuration as the REST client, usually via
/// [`crate::Client::create_bulk_read_client`].
#[derive(Debug)]
pub struct BulkReadClient {
    channel: TransportChannel,
}

impl BulkReadClient {
    pub(crate) fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = config
            .bulk_endpoint
            .clone()
            .ok_or_else(|| Error::config("no bulk read endpoint configured"))?;

        Ok(Self {
            channel: TransportChannel::open(endpoint, config.api_key.clone(), config.timeout)?,
        })
    }

    /// The underlying transport channel.
    pub const fn channel(&self) -> &TransportChannel {
        &self.channel
    }

    /// Stream the result of a read session as Arrow record batches.
    pub fn read(&self, session_id: &str) -> Result<BatchStream> {
        let response = self.channel.get_stream(session_id)?;
        BatchStream::from_reader(Box::new(response))
    }
}

/// Iterator over the record batches of one bulk-read stream.
pub struct BatchStream {
    inner: StreamReader<BufReader<Box<dyn Read + Send>>>,
}

impl BatchStream {
    pub(crate) fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let inner = StreamReader::try_new_buffered(reader, None)
            .map_err(|e| Error::bulk_read(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Schema of the streamed batches.
    pub fn schema(&self) -> SchemaRef {
        self.inner.schema()
    }
}

impl Iterator for BatchStream {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|batch| batch.map_err(|e| Error::bulk_read(e.to_string())))
    }
}

impl fmt::Debug for BatchStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchStream")
            .field("schema", &self.inner.schema())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::ipc::writer::StreamWriter;
    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema};

    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig::new("http://localhost:9050", "test-key", "test-project")
            .unwrap()
            .with_bulk_endpoint("http://localhost:9051")
            .unwrap()
    }

    fn encode_batches(batches: &[RecordBatch]) -> Vec<u8> {
        let schema = batches[0].schema();
        let mut buf = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buf, &schema).unwrap();
            for batch in batches {
                writer.write(batch).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_channel_close_is_not_idempotent() {
        let client = BulkReadClient::from_config(&test_config()).unwrap();
        assert!(!client.channel().is_closed());

        client.channel().close().unwrap();
        assert!(client.channel().is_closed());
        assert!(matches!(client.channel().close(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_read_on_closed_channel_fails() {
        let client = BulkReadClient::from_config(&test_config()).unwrap();
        client.channel().close().unwrap();
        assert!(matches!(client.read("sess"), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_from_config_requires_bulk_endpoint() {
        let config = ClientConfig::new("http://localhost:9050", "k", "p").unwrap();
        assert!(matches!(
            BulkReadClient::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_batch_stream_decodes_ipc() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![Arc::new(Int64Array::from(vec![1, 2, 3]))],
        )
        .unwrap();
        let bytes = encode_batches(&[batch]);

        let stream = BatchStream::from_reader(Box::new(std::io::Cursor::new(bytes))).unwrap();
        assert_eq!(stream.schema(), schema);

        let batches: Vec<_> = stream.collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 3);
    }

    #[test]
    fn test_batch_stream_rejects_garbage() {
        let result = BatchStream::from_reader(Box::new(std::io::Cursor::new(vec![1u8; 16])));
        assert!(matches!(result, Err(Error::BulkRead(_))));
    }
}
