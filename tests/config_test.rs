// ==========================================
// 配置加载集成测试
// ==========================================

use backoffice_import::config::{config_keys, ConfigManager, ImportConfigReader};
use std::io::Write;

#[tokio::test]
async fn test_config_path_from_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"max_error_details": 3, "max_file_size_mb": 2, "locale": "zh-CN"}}"#
    )
    .unwrap();

    // 本测试文件内唯一修改该环境变量的测试
    std::env::set_var(config_keys::CONFIG_PATH_ENV, file.path());
    let manager = ConfigManager::load().unwrap();
    std::env::remove_var(config_keys::CONFIG_PATH_ENV);

    assert_eq!(manager.source(), Some(file.path()));
    assert_eq!(manager.get_max_error_details().await.unwrap(), 3);
    assert_eq!(manager.get_max_file_size_bytes().await.unwrap(), 2 * 1024 * 1024);
    assert_eq!(manager.get_locale().await.unwrap(), "zh-CN");
    assert_eq!(manager.get_preview_rows().await.unwrap(), 5);
}
