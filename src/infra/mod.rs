pub mod http_client;
pub mod openai;
pub mod webdriver;

pub use http_client::ReqwestHttp;
pub use openai::OpenAiCompletion;
pub use webdriver::{WebDriverLauncher, WebDriverSession};
