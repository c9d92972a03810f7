use std::path::{Path, PathBuf};

use cutcost_engine::session::{Event, RejectReason};
use cutcost_io::{DrawingFacade, IoError, display_name};
use tracing::{info, warn};

/// 一次只处理一个上传文件，多余的路径被忽略。
pub fn select_upload(paths: &[PathBuf]) -> Option<&Path> {
    let (first, rest) = paths.split_first()?;
    if !rest.is_empty() {
        warn!(
            selected = %first.display(),
            ignored = rest.len(),
            "选择了多个文件，仅处理第一个"
        );
    }
    Some(first.as_path())
}

/// 读取上传文件并转换为状态机事件。
#[derive(Debug, Clone, Default)]
pub struct UploadLoader {
    facade: DrawingFacade,
}

impl UploadLoader {
    pub fn new(svg_tolerance: f32) -> Self {
        Self {
            facade: DrawingFacade::with_svg_tolerance(svg_tolerance),
        }
    }

    pub fn load_event(&self, path: &Path) -> Event {
        let file_name = display_name(path);
        match self.facade.load(path) {
            Ok(drawing) => {
                info!(path = %path.display(), kind = %drawing.kind(), "读取上传文件成功");
                Event::FileLoaded { file_name, drawing }
            }
            Err(IoError::UnsupportedExtension { .. }) => Event::FileRejected {
                file_name,
                reason: RejectReason::UnsupportedExtension,
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "读取上传文件失败");
                Event::FileRejected {
                    file_name,
                    reason: RejectReason::Unreadable(err.to_string()),
                }
            }
        }
    }
}
