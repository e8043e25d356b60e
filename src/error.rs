use std::path::PathBuf;

use thiserror::Error;

/// 游戏中可能出现的错误
#[derive(Error, Debug)]
pub enum GameError {
    /// 文件读取失败
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置或地图 JSON 解析失败
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// tiled 无法读取 TMX 地图或图块集
    #[error("TMX error: {0}")]
    Tiled(#[from] tiled::Error),

    /// 地图结构不符合要求
    #[error("Map error: {message}")]
    Map { message: String },

    /// 图片或音频无法解码
    #[error("Asset error at {path}: {message}")]
    Asset { path: PathBuf, message: String },
}

impl GameError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GameError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn map(message: impl Into<String>) -> Self {
        GameError::Map {
            message: message.into(),
        }
    }

    pub fn asset(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        GameError::Asset {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
