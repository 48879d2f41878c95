//! User-facing messages. The service speaks Korean to its clients.

pub const LOGIN_REQUIRED: &str = "로그인이 필요합니다.";
/// Same text for an unknown email and a wrong password.
pub const BAD_CREDENTIALS: &str = "이메일과 비밀번호를 확인해주세요";
pub const WRONG_PASSWORD: &str = "현재 비밀번호가 틀립니다.";
pub const EMAIL_TAKEN: &str = "회원가입이 불가능한 이메일입니다.";
pub const NOT_AUTHOR_UPDATE: &str = "작성한 본인만 수정할 수 있습니다.";
pub const NOT_AUTHOR_DELETE: &str = "작성한 본인만 삭제할 수 있습니다.";
pub const INTERNAL: &str = "서버 내부 오류가 발생했습니다.";

pub const USERNAME_REQUIRED: &str = "이름을 입력해주세요.";
pub const PASSWORD_REQUIRED: &str = "비밀번호를 입력해주세요.";
pub const OLD_PASSWORD_REQUIRED: &str = "현재 비밀번호를 입력해주세요.";
pub const NEW_PASSWORD_REQUIRED: &str = "새 비밀번호를 입력해주세요.";
pub const EMAIL_REQUIRED: &str = "이메일을 입력해주세요.";
pub const EMAIL_INVALID: &str = "올바른 이메일 형식을 입력해주세요.";
pub const TITLE_REQUIRED: &str = "제목 입력은 필수입니다.";
pub const CONTENTS_REQUIRED: &str = "내용 입력은 필수입니다.";
pub const PAGE_NUM_INVALID: &str = "페이지 번호는 1 이상이어야 합니다.";

pub fn not_found(id: impl std::fmt::Display) -> String {
    format!("해당 아이디 값이 존재하지 않습니다. : {id}")
}

pub fn username_too_long(max: usize) -> String {
    format!("유저 이름은 {max}글자 이내로 가능해요.")
}

pub fn title_too_long(max: usize) -> String {
    format!("제목은 {max}글자 이내로 작성가능합니다.")
}

pub fn page_size_invalid(max: u32) -> String {
    format!("페이지 크기는 1 이상 {max} 이하여야 합니다.")
}

pub fn bad_request(detail: impl std::fmt::Display) -> String {
    format!("잘못된 요청입니다. : {detail}")
}
