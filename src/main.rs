use anyhow::Result;
use rustyline::error::ReadlineError;
use serde_json::{Map, Value};

use admin_console::config::{ScreenFields, SearchFieldConfig, TableMappingConfig};
use admin_console::search::{build_query_descriptor, build_sort_directives, SortColumn};
use admin_console::selection::PermissionTree;
use admin_console::sql_compiler::{CompilerConfig, ListingRequest, SqlCompiler};
use admin_console::tree::{filter_tree, key_list, TreeNode, TypeTag};

/// 创建SQL编译器实例，优先使用JSON配置，失败时使用默认配置
fn create_compiler_with_config() -> SqlCompiler {
    match TableMappingConfig::from_json_file("table_mapping.json") {
        Ok(table_config) => {
            println!("✅ 成功从JSON配置文件加载表映射");
            SqlCompiler::from_config(CompilerConfig {
                table_mapping: table_config.mappings,
            })
        }
        Err(e) => {
            println!("⚠️ 无法加载表映射配置 ({}), 使用默认配置", e);
            SqlCompiler::from_config(CompilerConfig {
                table_mapping: TableMappingConfig::default().mappings,
            })
        }
    }
}

/// 加载检索字段配置，失败时使用内置的四个页面默认划分
fn load_search_fields() -> SearchFieldConfig {
    match SearchFieldConfig::from_json_file("search_fields.json") {
        Ok(config) => {
            println!("✅ 成功从JSON配置文件加载检索字段划分");
            config
        }
        Err(e) => {
            println!("⚠️ 无法加载检索字段配置 ({}), 使用默认配置", e);
            SearchFieldConfig::default()
        }
    }
}

/// 构造演示用的菜单树: 目录 > 菜单 > 功能
fn demo_menu_tree() -> Vec<TreeNode> {
    let node = |id: &str, parent: &str, name: &str, kind: (&str, &str)| TreeNode {
        id: id.to_string(),
        parent_id: parent.to_string(),
        name: name.to_string(),
        type_tag: TypeTag::new(kind.0, kind.1),
        children: None,
    };
    let catalog = ("Catalog", "目录");
    let menu = ("Menu", "菜单");
    let function = ("Function", "功能");

    let mut user_menu = node("2", "1", "用户管理", menu);
    user_menu.children = Some(vec![
        node("3", "2", "新增用户", function),
        node("4", "2", "删除用户", function),
    ]);
    let mut role_menu = node("5", "1", "角色管理", menu);
    role_menu.children = Some(vec![node("6", "5", "角色赋权", function)]);
    let mut root = node("1", "0", "系统管理", catalog);
    root.children = Some(vec![user_menu, role_menu]);
    vec![root]
}

fn main() -> Result<()> {
    println!("--- Admin Console: 树形权限与检索核心演示 ---");

    println!("\n[配置信息]:");
    let search_fields = load_search_fields();
    let compiler = create_compiler_with_config();

    // 1. 树过滤: 从完整菜单树得到"上级菜单"候选(排除功能节点)
    println!("\n[步骤 1]: 递归过滤树状菜单...");
    let menu_tree = demo_menu_tree();
    println!("完整菜单树共 {} 个节点", key_list(&menu_tree).len());
    let higher_menus = filter_tree(&menu_tree, &|n| n.type_tag.id != "Function");
    println!("✓ 过滤后的上级菜单候选: {} 个顶级节点", higher_menus.len());
    for id in key_list(&higher_menus) {
        println!("  保留节点: {}", id);
    }

    // 2. 角色赋权: 加载已授权菜单 -> 用户勾选 -> 展平保存
    println!("\n[步骤 2]: 角色菜单赋权的三态选择...");
    let permission_tree = PermissionTree::new(&menu_tree);
    let granted = vec!["3".to_string(), "9999".to_string()];
    let state = permission_tree.load_selection(&granted);
    println!("✓ 已授权Id {:?} 加载完成 (不存在的Id被忽略)", granted);
    println!("  节点2半选: {}", state.is_indeterminate("2"));
    println!("  节点1半选: {}", state.is_indeterminate("1"));

    let state = permission_tree.toggle(&state, "5", true);
    println!("✓ 勾选角色管理子树后, 保存载荷: {:?}", {
        let mut ids = state.flatten();
        ids.sort();
        ids
    });

    // 3. 检索表单 -> 查询描述符
    println!("\n[步骤 3]: 检索表单归一化...");
    let mut form = Map::new();
    form.insert("username".to_string(), Value::String("张".to_string()));
    form.insert("enable".to_string(), Value::Bool(false));
    form.insert(
        "createTime".to_string(),
        Value::Array(vec![
            Value::String("2024-01-01".to_string()),
            Value::String("2024-01-31".to_string()),
        ]),
    );
    form.insert("remark".to_string(), Value::String(String::new()));

    let fields = search_fields.screen("user");
    let descriptor = build_query_descriptor(&form, &fields.filter_fields, &fields.extra_date_fields);
    println!("✓ 查询描述符:");
    println!("{}", serde_json::to_string_pretty(&descriptor)?);

    // 4. 编译为列表SQL
    println!("\n[步骤 4]: 编译为列表SQL...");
    let sort = SortColumn {
        prop: Some("updateTime".to_string()),
        order: Some("descending".to_string()),
    };
    let request = ListingRequest {
        descriptor,
        sort_bys: build_sort_directives(&sort),
        page: 1,
        size: 20,
    };
    match compiler.compile(&request, "User") {
        Ok(sql) => {
            println!("✅ 成功编译为 SQL");
            println!("{}", sql);
        }
        Err(e) => println!("✗ SQL 编译失败: {}", e.message),
    }

    interactive_query_console(&compiler, &search_fields.screen("user"))?;
    Ok(())
}

/// 交互模式: 输入 `key=value; key=value` 形式的检索条件,
/// 查看归一化后的描述符与编译出的SQL。输入 exit 退出。
fn interactive_query_console(compiler: &SqlCompiler, fields: &ScreenFields) -> Result<()> {
    println!("\n--- 交互模式 ---");
    println!("示例: username=张; enable=true; createTime=2024-01-01..2024-01-31");

    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        let line = match rl.readline("search> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" {
            break;
        }
        rl.add_history_entry(trimmed)?;

        let form = parse_form_line(trimmed);
        let descriptor =
            build_query_descriptor(&form, &fields.filter_fields, &fields.extra_date_fields);
        println!("{}", serde_json::to_string_pretty(&descriptor)?);

        let request = ListingRequest {
            descriptor,
            sort_bys: vec![],
            page: 1,
            size: 20,
        };
        match compiler.compile(&request, "User") {
            Ok(sql) => println!("{}", sql),
            Err(e) => println!("✗ SQL 编译失败: {}", e.message),
        }
    }
    Ok(())
}

/// 把一行 `key=value; ...` 输入解析为检索表单
///
/// `a..b` 解析为时间区间数组, true/false 与整数解析为对应类型,
/// 其余按字符串处理。
fn parse_form_line(line: &str) -> Map<String, Value> {
    let mut form = Map::new();
    for pair in line.split(';') {
        let Some((key, raw)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let raw = raw.trim();
        let value = if let Some((begin, end)) = raw.split_once("..") {
            Value::Array(vec![
                Value::String(begin.trim().to_string()),
                Value::String(end.trim().to_string()),
            ])
        } else if raw == "true" || raw == "false" {
            Value::Bool(raw == "true")
        } else if let Ok(n) = raw.parse::<i64>() {
            Value::Number(n.into())
        } else {
            Value::String(raw.to_string())
        };
        form.insert(key.to_string(), value);
    }
    form
}
