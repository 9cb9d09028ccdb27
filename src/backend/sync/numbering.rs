//! Next document number across QuickBooks and the local database

use serde::Serialize;

use super::SyncContext;
use crate::backend::db::documents::recent_document_numbers;
use crate::backend::error::BackendError;
use crate::backend::quickbooks::client::rows;
use crate::backend::quickbooks::types::DocNumberRow;
use crate::shared::accounting::DocumentKind;
use crate::shared::numbering::extract_next_number;

/// Recent remote numbers considered
pub const REMOTE_CANDIDATES: usize = 100;
/// Recent local numbers considered
pub const LOCAL_CANDIDATES: i64 = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextNumber {
    pub next_number: String,
    /// False when QuickBooks was not connected and only local numbers were used
    pub used_remote: bool,
}

/// Compute the next number for a document kind
///
/// Without a QuickBooks connection the local numbers alone decide; any other
/// remote failure aborts.
pub async fn next_document_number(
    ctx: &SyncContext,
    kind: DocumentKind,
) -> Result<NextNumber, BackendError> {
    let (mut candidates, used_remote) = match ctx.tokens.get_valid_token().await {
        Ok(conn) => {
            let entity = kind.entity_type();
            let query = format!(
                "SELECT DocNumber FROM {} ORDERBY MetaData.CreateTime DESC MAXRESULTS {}",
                entity.remote_name(),
                REMOTE_CANDIDATES
            );
            let mut response = ctx.client.query(&conn, &query).await?;
            let remote: Vec<DocNumberRow> = rows(response.take(entity))?;
            let numbers: Vec<String> = remote.into_iter().filter_map(|r| r.doc_number).collect();
            (numbers, true)
        }
        Err(BackendError::NotConnected) => {
            tracing::warn!("QuickBooks not connected, numbering {:?} from local records only", kind);
            (Vec::new(), false)
        }
        Err(e) => return Err(e),
    };

    let local = recent_document_numbers(&ctx.pool, kind, LOCAL_CANDIDATES).await?;
    candidates.extend(local);

    let next_number = extract_next_number(&candidates, kind.default_prefix());
    tracing::debug!("Next {:?} number from {} candidates: {}", kind, candidates.len(), next_number);

    Ok(NextNumber {
        next_number,
        used_remote,
    })
}
