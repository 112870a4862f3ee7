//! Aggregates paginated listings into a single sequence.

// self
use crate::_prelude::*;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pagination metadata attached to a listing page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
	/// One-based page number of this page.
	pub page: u32,
	/// Requested page size.
	pub page_size: u32,
	/// Total number of items across all pages.
	pub total_results: u64,
	/// Total number of pages.
	pub total_page_count: u32,
}

/// One page of a listing; endpoints that do not paginate omit `pagination`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Items on this page.
	pub data: Vec<T>,
	/// Pagination metadata, absent for non-paginated endpoints.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pagination: Option<PaginationMeta>,
}

/// Page coordinates handed to the fetch function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
	/// One-based page number.
	pub page: u32,
	/// Page size.
	pub page_size: u32,
}

/// Fetches pages starting at 1 and concatenates their `data` in order.
///
/// Stops after the first call when the page carries no pagination metadata; otherwise keeps
/// going while the next page number does not exceed `totalPageCount`.
pub async fn collect_pages<T, E, F, Fut>(mut fetch: F, page_size: Option<u32>) -> Result<Vec<T>, E>
where
	F: FnMut(PageRequest) -> Fut,
	Fut: Future<Output = Result<Page<T>, E>>,
{
	let page_size = page_size.filter(|size| *size > 0).unwrap_or(DEFAULT_PAGE_SIZE);
	let mut items = Vec::new();
	let mut page = 1;

	loop {
		let Page { data, pagination } = fetch(PageRequest { page, page_size }).await?;

		items.extend(data);

		let Some(meta) = pagination else {
			break;
		};

		page += 1;

		if page > meta.total_page_count {
			break;
		}
	}

	Ok(items)
}

#[cfg(test)]
mod tests {
	// crates.io
	use parking_lot::Mutex;
	// self
	use super::*;

	fn page(data: Vec<u32>, page: u32, total_page_count: u32) -> Page<u32> {
		Page {
			data,
			pagination: Some(PaginationMeta {
				page,
				page_size: 2,
				total_results: 6,
				total_page_count,
			}),
		}
	}

	#[tokio::test]
	async fn walks_every_page_in_order() {
		let calls = Mutex::new(Vec::new());
		let items = collect_pages(
			|request: PageRequest| {
				calls.lock().push((request.page, request.page_size));

				let start = (request.page - 1) * 2;

				async move {
					Ok::<_, Error>(page(vec![start + 1, start + 2], request.page, 3))
				}
			},
			Some(2),
		)
		.await
		.expect("Pagination should succeed.");

		assert_eq!(*calls.lock(), vec![(1, 2), (2, 2), (3, 2)]);
		assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
	}

	#[tokio::test]
	async fn missing_metadata_stops_after_one_call() {
		let calls = Mutex::new(0);
		let items = collect_pages(
			|_| {
				*calls.lock() += 1;

				async { Ok::<_, Error>(Page { data: vec![7, 8, 9], pagination: None }) }
			},
			None,
		)
		.await
		.expect("Single page should succeed.");

		assert_eq!(*calls.lock(), 1);
		assert_eq!(items, vec![7, 8, 9]);
	}

	#[tokio::test]
	async fn default_page_size_applies() {
		let seen = Mutex::new(None);

		collect_pages(
			|request: PageRequest| {
				*seen.lock() = Some(request.page_size);

				async { Ok::<_, Error>(Page::<u32> { data: Vec::new(), pagination: None }) }
			},
			Some(0),
		)
		.await
		.expect("Empty page should succeed.");

		assert_eq!(*seen.lock(), Some(DEFAULT_PAGE_SIZE));
	}

	#[tokio::test]
	async fn errors_stop_the_walk() {
		let calls = Mutex::new(0);
		let result = collect_pages(
			|request: PageRequest| {
				*calls.lock() += 1;

				async move {
					if request.page == 2 {
						Err(Error::invalid_arguments("page 2 failed"))
					} else {
						Ok(page(vec![1, 2], request.page, 3))
					}
				}
			},
			Some(2),
		)
		.await;

		assert!(result.is_err());
		assert_eq!(*calls.lock(), 2);
	}

	#[test]
	fn page_decodes_camel_case_metadata() {
		let page: Page<String> = serde_json::from_str(
			r#"{"data":["a"],"pagination":{"page":1,"pageSize":50,"totalResults":1,"totalPageCount":1}}"#,
		)
		.expect("Page should decode.");

		assert_eq!(page.pagination.map(|meta| meta.page_size), Some(50));

		let bare: Page<String> =
			serde_json::from_str(r#"{"data":[]}"#).expect("Bare page should decode.");

		assert!(bare.pagination.is_none());
	}
}
