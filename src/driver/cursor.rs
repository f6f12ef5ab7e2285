//! Cursor - 스트리밍 커서
//!
//! 토큰 단위 배치 응답 위의 스트리밍 반복자

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use serde_json::Value;

use crate::reql::message::tag;
use crate::reql::{Response, ResponseType};

use super::config::RunOptions;
use super::connection::ConnectionInner;
use super::convert::convert_datum;
use super::datum::Datum;
use super::error::{DriverError, DriverResult};

// ============================================================================
// CursorShared - 레지스트리 소유 커서 상태
// ============================================================================

/// 커서 상태
///
/// 배치 FIFO와 헤드 배치 내 위치, 종료/진행 플래그를 담습니다.
#[derive(Debug)]
struct CursorState {
    /// 미소비 배치 FIFO
    batches: VecDeque<Response>,
    /// 헤드 배치 `r` 배열 내 위치
    index: usize,
    /// 처음 관측된 응답 타입 태그
    first_type: Option<i32>,
    /// 종료 플래그: 더 이상 배치가 들어오지 않음
    ended: bool,
    /// START 또는 CONTINUE가 미결인 동안 참
    outstanding: bool,
}

/// 레지스트리가 소유하는 토큰 단위 커서 상태
///
/// 연결 레지스트리가 이 상태를 소유하고, [`Cursor`] 핸들은 토큰과 연결
/// 내부로의 역참조만 가집니다.
#[derive(Debug)]
pub(crate) struct CursorShared {
    /// 쿼리 토큰
    token: u64,
    /// 의사 타입 변환 옵션
    opts: RunOptions,
    /// 에러 보고용 원본 텀 트리
    term: Option<Value>,
    /// 가변 상태
    state: Mutex<CursorState>,
}

/// `next` 한 스텝의 결과
enum Step {
    /// 변환 전의 다음 행
    Row(Value),
    /// WAIT_COMPLETE 신호
    WaitComplete,
    /// 헤드에 남는 에러 응답 (고정)
    Failed(DriverError),
    /// 배치 소진, 더 오지 않음
    Exhausted,
    /// 큐 비어 있음; `request_continue`면 이 호출자가 CONTINUE를 보냄
    Pending { request_continue: bool },
}

impl CursorShared {
    /// 새 커서 상태 생성
    ///
    /// 등록 직후에는 START(또는 NOREPLY_WAIT)가 미결 상태입니다.
    pub(crate) fn new(token: u64, opts: RunOptions, term: Option<Value>) -> Self {
        Self {
            token,
            opts,
            term,
            state: Mutex::new(CursorState {
                batches: VecDeque::new(),
                index: 0,
                first_type: None,
                ended: false,
                outstanding: true,
            }),
        }
    }

    /// 쿼리 토큰
    pub(crate) fn token(&self) -> u64 {
        self.token
    }

    /// 프레임 도착 시 연결이 호출
    ///
    /// `r`가 비어 있지 않거나 WAIT_COMPLETE면 배치를 큐에 넣습니다. 종료
    /// 응답(PARTIAL/FEED 이외)은 종료 플래그를 세우고, 미결 플래그는 항상
    /// 내립니다.
    pub(crate) fn add_response(&self, response: Response) {
        let mut st = self.state.lock();
        if st.first_type.is_none() {
            st.first_type = Some(response.t);
        }
        let terminal = response.is_terminal();
        if !response.r.is_empty() || response.t == tag::WAIT_COMPLETE {
            st.batches.push_back(response);
        }
        if terminal {
            st.ended = true;
        }
        st.outstanding = false;
    }

    /// 종료되었고 미결 요청도 없는지 (레지스트리 정리 조건)
    pub(crate) fn is_finished(&self) -> bool {
        let st = self.state.lock();
        st.ended && !st.outstanding
    }

    /// 커서를 종료 상태로 전환
    ///
    /// 이미 종료였으면 `true`를 돌려줍니다.
    pub(crate) fn finish(&self) -> bool {
        let mut st = self.state.lock();
        let already = st.ended;
        st.ended = true;
        st.outstanding = false;
        already
    }

    /// 처음 관측된 응답 타입
    fn first_type(&self) -> Option<i32> {
        self.state.lock().first_type
    }

    /// CONTINUE 전송 실패 시 미결 플래그 롤백
    fn clear_outstanding(&self) {
        self.state.lock().outstanding = false;
    }

    /// 다음 스텝 결정
    fn next_step(&self) -> Step {
        let mut st = self.state.lock();
        loop {
            let Some(head) = st.batches.front() else {
                if st.ended {
                    return Step::Exhausted;
                }
                let request_continue = !st.outstanding;
                if request_continue {
                    st.outstanding = true;
                }
                return Step::Pending { request_continue };
            };

            match head.kind() {
                Some(ResponseType::WaitComplete) => {
                    st.batches.pop_front();
                    st.index = 0;
                    return Step::WaitComplete;
                }
                Some(kind) if kind.is_error() => {
                    // error batches stay at the head; every pull re-yields them
                    return Step::Failed(DriverError::from_response(
                        kind,
                        head.first_message(),
                        self.term.clone(),
                        head.b.clone(),
                    ));
                }
                Some(_) => {
                    if let Some(row) = head.r.get(st.index) {
                        let row = row.clone();
                        st.index += 1;
                        if st.index >= st.batches[0].r.len() {
                            st.batches.pop_front();
                            st.index = 0;
                        }
                        return Step::Row(row);
                    }
                    st.batches.pop_front();
                    st.index = 0;
                }
                None => {
                    return Step::Failed(DriverError::driver(format!(
                        "Unknown response type: {}",
                        head.t
                    )));
                }
            }
        }
    }
}

// ============================================================================
// Cursor - 커서 핸들
// ============================================================================

/// 쿼리 결과 스트리밍 커서
///
/// 배치가 소진되면 토큰에 대해 CONTINUE를 (동시에 최대 하나만) 보내고
/// 공유 소켓에서 다음 프레임을 기다립니다.
pub struct Cursor {
    conn: Arc<ConnectionInner>,
    shared: Arc<CursorShared>,
}

impl Cursor {
    pub(crate) fn new(conn: Arc<ConnectionInner>, shared: Arc<CursorShared>) -> Self {
        Self { conn, shared }
    }

    /// 쿼리 토큰
    pub fn token(&self) -> u64 {
        self.shared.token()
    }

    /// 피드 커서 여부
    pub fn is_feed(&self) -> bool {
        self.shared.first_type() == Some(tag::SUCCESS_FEED)
    }

    /// 다음 행 가져오기
    ///
    /// 행은 의사 타입 변환을 거쳐 [`Datum`]으로 나옵니다. WAIT_COMPLETE는
    /// [`Datum::Null`]을 한 번 내놓습니다. 서버 에러는 고정되어 이후 모든
    /// 호출에서 같은 에러가 나오고, 소진된 커서는 no-more-rows 드라이버
    /// 에러를 냅니다.
    pub async fn next(&mut self) -> DriverResult<Datum> {
        loop {
            match self.shared.next_step() {
                Step::Row(row) => return convert_datum(row, &self.shared.opts),
                Step::WaitComplete => return Ok(Datum::Null),
                Step::Failed(err) => return Err(err),
                Step::Exhausted => return Err(DriverError::no_more_rows()),
                Step::Pending { request_continue } => {
                    self.pump(request_continue).await?;
                }
            }
        }
    }

    /// 다음 행 가져오기 (소진은 `None`)
    ///
    /// no-more-rows 센티널을 `Ok(None)`으로 바꿉니다.
    pub async fn try_next(&mut self) -> DriverResult<Option<Datum>> {
        match self.next().await {
            Ok(datum) => Ok(Some(datum)),
            Err(err) if err.is_no_more_rows() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// 행마다 콜백 호출
    ///
    /// 콜백이 `false`를 돌려주면 중단합니다. 정상 소진이면 `Ok(())`.
    pub async fn each<F>(&mut self, mut on_row: F) -> DriverResult<()>
    where
        F: FnMut(Datum) -> bool,
    {
        while let Some(row) = self.try_next().await? {
            if !on_row(row) {
                break;
            }
        }
        Ok(())
    }

    /// 모든 행을 배열로 수집
    ///
    /// 피드는 끝이 없으므로 거부합니다.
    pub async fn to_array(&mut self) -> DriverResult<Vec<Datum>> {
        // the first response reveals whether this is a feed
        loop {
            let known = {
                let first = self.shared.first_type();
                first.is_some() || self.shared.is_finished()
            };
            if known {
                break;
            }
            self.pump(false).await?;
        }

        if self.is_feed() {
            return Err(DriverError::driver(
                "`to_array` is not available for feeds.",
            ));
        }

        let mut rows = Vec::new();
        while let Some(row) = self.try_next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// 커서 닫기
    ///
    /// 아직 종료 전이면 토큰에 대해 STOP을 보냅니다. 서버가 보내는 마지막
    /// 응답은 레지스트리가 버립니다.
    pub async fn close(&mut self) -> DriverResult<()> {
        if self.shared.finish() {
            return Ok(());
        }
        self.conn.stop_query(self.shared.token()).await
    }

    /// `futures::Stream` 어댑터로 변환
    ///
    /// 에러는 한 번 내보낸 뒤 스트림을 끝냅니다.
    pub fn into_stream(self) -> CursorStream {
        let stream = futures::stream::unfold((self, false), |(mut cursor, done)| async move {
            if done {
                return None;
            }
            match cursor.try_next().await {
                Ok(Some(row)) => Some((Ok(row), (cursor, false))),
                Ok(None) => None,
                Err(err) => Some((Err(err), (cursor, true))),
            }
        });
        CursorStream {
            inner: Box::pin(stream),
        }
    }

    /// CONTINUE 전송(필요 시)과 프레임 한 개 수신
    async fn pump(&self, request_continue: bool) -> DriverResult<()> {
        if request_continue {
            if let Err(err) = self.conn.continue_query(self.shared.token()).await {
                self.shared.clear_outstanding();
                return Err(err);
            }
        }
        self.conn.recv_dispatch().await
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("token", &self.shared.token())
            .field("finished", &self.shared.is_finished())
            .finish()
    }
}

// ============================================================================
// CursorStream - 비동기 스트림 어댑터
// ============================================================================

/// 커서 기반 비동기 스트림
pub struct CursorStream {
    inner: Pin<Box<dyn Stream<Item = DriverResult<Datum>> + Send>>,
}

impl Stream for CursorStream {
    type Item = DriverResult<Datum>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for CursorStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorStream").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(t: i32, r: Vec<Value>) -> Response {
        Response {
            t,
            r,
            b: None,
            p: None,
            n: None,
        }
    }

    fn shared() -> CursorShared {
        CursorShared::new(1, RunOptions::default(), None)
    }

    #[test]
    fn test_add_response_clears_outstanding() {
        let cursor = shared();
        assert!(!cursor.is_finished());

        cursor.add_response(response(tag::SUCCESS_SEQUENCE, vec![json!(1)]));
        assert!(cursor.is_finished());
        assert_eq!(cursor.first_type(), Some(tag::SUCCESS_SEQUENCE));
    }

    #[test]
    fn test_partial_does_not_end() {
        let cursor = shared();
        cursor.add_response(response(tag::SUCCESS_PARTIAL, vec![json!(1)]));
        assert!(!cursor.is_finished());

        cursor.add_response(response(tag::SUCCESS_FEED, vec![json!(2)]));
        assert!(!cursor.is_finished());
    }

    #[test]
    fn test_empty_wait_complete_is_retained() {
        let cursor = shared();
        cursor.add_response(response(tag::WAIT_COMPLETE, vec![]));

        assert!(matches!(cursor.next_step(), Step::WaitComplete));
        assert!(matches!(cursor.next_step(), Step::Exhausted));
    }

    #[test]
    fn test_empty_partial_is_dropped() {
        let cursor = shared();
        cursor.add_response(response(tag::SUCCESS_PARTIAL, vec![]));

        // nothing queued; the caller must issue a CONTINUE
        match cursor.next_step() {
            Step::Pending { request_continue } => assert!(request_continue),
            _ => panic!("expected pending step"),
        }
        // a second pull must not issue another CONTINUE
        match cursor.next_step() {
            Step::Pending { request_continue } => assert!(!request_continue),
            _ => panic!("expected pending step"),
        }
    }

    #[test]
    fn test_rows_in_batch_order() {
        let cursor = shared();
        cursor.add_response(response(tag::SUCCESS_PARTIAL, vec![json!(1), json!(2)]));
        cursor.add_response(response(tag::SUCCESS_SEQUENCE, vec![json!(3)]));

        let mut seen = Vec::new();
        loop {
            match cursor.next_step() {
                Step::Row(v) => seen.push(v),
                Step::Exhausted => break,
                _ => panic!("unexpected step"),
            }
        }
        assert_eq!(seen, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_error_is_sticky() {
        let cursor = shared();
        let mut resp = response(tag::RUNTIME_ERROR, vec![json!("boom")]);
        resp.b = Some(json!([0]));
        cursor.add_response(resp);
        assert!(cursor.is_finished());

        for _ in 0..3 {
            match cursor.next_step() {
                Step::Failed(err) => {
                    assert!(matches!(err, DriverError::Runtime(_)));
                    assert!(err.to_string().contains("boom"));
                }
                _ => panic!("expected sticky error"),
            }
        }
    }

    #[test]
    fn test_unknown_response_type() {
        let cursor = shared();
        cursor.add_response(response(99, vec![json!("?")]));

        match cursor.next_step() {
            Step::Failed(err) => {
                assert!(err.to_string().contains("Unknown response type: 99"));
            }
            _ => panic!("expected error step"),
        }
    }

    #[test]
    fn test_finish_is_idempotent() {
        let cursor = shared();
        assert!(!cursor.finish());
        assert!(cursor.finish());
        assert!(cursor.is_finished());
    }
}
