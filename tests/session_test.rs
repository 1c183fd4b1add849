//! Session Integration Tests
//!
//! Utterance -> router -> extractor -> resolver -> executor, against an
//! in-memory board service.

mod common;

use chatboard::Dispatch;
use common::{FakeBoardService, FakeTaskService, DEFAULT_BOARD, OTHER_BOARD};

#[tokio::test]
async fn test_list_boards_is_cached() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("mostrar quadros").await.unwrap();
    assert!(reply.starts_with("📋 Quadros do Trello"));
    assert!(reply.contains("Produto"));
    assert!(reply.contains("Marketing"));
    assert!(reply.contains(&format!("ID: {}", OTHER_BOARD)));

    session.handle("listar os boards").await.unwrap();
    assert_eq!(boards.calls("list_boards"), 1);
}

#[tokio::test]
async fn test_list_lists_explicit_board_id() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("mostrar listas do quadro com id XYZ999")
        .await
        .unwrap();
    assert!(reply.contains("quadro com ID XYZ999"));
    assert!(reply.contains("Campanhas (ID: l3) - 2 cards"));
    assert_eq!(boards.calls_with("list_lists", OTHER_BOARD), 1);
    assert_eq!(boards.calls_with("list_lists", DEFAULT_BOARD), 0);
}

#[tokio::test]
async fn test_list_lists_uses_default_board() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("mostrar listas").await.unwrap();
    assert!(reply.contains("quadro com ID AAA111"));
    assert!(reply.contains("Backlog (ID: l1) - 1 cards"));
    assert!(reply.contains("Em Andamento"));
    assert!(!reply.contains("Campanhas"));
    assert_eq!(boards.calls_with("list_lists", DEFAULT_BOARD), 1);
    assert_eq!(boards.calls("list_boards"), 0);
}

#[tokio::test]
async fn test_list_lists_without_default_board() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session_with(&boards, &tasks, None);

    let reply = session.handle("mostrar listas").await.unwrap();
    assert!(reply.starts_with("❌ Configuração ausente"));
    assert!(reply.contains("TRELLO_BOARD_ID"));
    assert_eq!(boards.calls("list_lists"), 0);
}

#[tokio::test]
async fn test_two_card_creations_share_one_list_lookup() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let first = session
        .handle("criar card chamado Deploy na lista Backlog")
        .await
        .unwrap();
    let second = session
        .handle("criar card chamado Testes na lista Backlog com descrição cobrir o resolver prazo 25/12/2030")
        .await
        .unwrap();

    assert!(first.starts_with("✅ Card 'Deploy' criado com sucesso!"));
    assert!(first.contains("Na lista: Backlog"));
    assert!(second.contains("Prazo: 2030-12-25"));

    assert_eq!(boards.calls("list_lists"), 1);
    assert_eq!(boards.calls_with("create_card", "l1"), 2);
}

#[tokio::test]
async fn test_create_card_with_link_in_description() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("criar card chamado Docs na lista Backlog com descrição ver https://docs.example.com/guia")
        .await
        .unwrap();

    assert!(reply.starts_with("✅ Card 'Docs' criado com sucesso!"));
    assert_eq!(boards.calls_with("create_card", "l1"), 1);
    assert_eq!(boards.calls_with("list_lists", DEFAULT_BOARD), 1);
}

#[tokio::test]
async fn test_create_card_requires_list() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("criar card chamado Deploy").await.unwrap();
    assert!(reply.starts_with("❌ ID ou nome da lista não especificado"));
    assert_eq!(boards.calls("create_card"), 0);
}

#[tokio::test]
async fn test_unknown_list_is_not_found() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("criar card chamado Deploy na lista Inexistente")
        .await
        .unwrap();
    assert_eq!(
        reply,
        "❌ Lista 'Inexistente' não encontrado(a). Verifique o nome e tente novamente."
    );
    // Default board first, then every other board
    assert_eq!(boards.calls_with("list_lists", DEFAULT_BOARD), 1);
    assert_eq!(boards.calls_with("list_lists", OTHER_BOARD), 1);
}

#[tokio::test]
async fn test_list_found_on_other_board() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("mostrar cards da lista Campanhas")
        .await
        .unwrap();
    assert!(reply.starts_with("🗂️ Cards da Lista 'Campanhas'"));
    assert!(reply.contains("Post blog"));
    assert!(reply.contains("Descrição: rascunho"));
}

#[tokio::test]
async fn test_list_cards_grouped_by_list() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("mostrar cards").await.unwrap();
    assert!(reply.contains("📋 Lista: Backlog"));
    assert!(reply.contains("📋 Lista: Em Andamento"));
    assert!(reply.contains("Relatório mensal"));
    // Long descriptions are cut at 50 characters
    assert!(reply.contains("..."));
    assert!(!reply.contains("Post blog"));
}

#[tokio::test]
async fn test_archive_card_invalidates_cards() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("arquivar card chamado Deploy").await.unwrap();
    assert_eq!(reply, "✅ Card 'Deploy API' da lista 'Backlog' arquivado com sucesso!");
    assert_eq!(boards.calls_with("update_card", "c1"), 1);

    let listing = session.handle("mostrar cards da lista Backlog").await.unwrap();
    assert!(listing.contains("Nenhum card encontrado na lista 'Backlog'"));
    assert_eq!(boards.calls_with("list_cards", "l1"), 2);
}

#[tokio::test]
async fn test_create_list_invalidates_lists() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    session.handle("mostrar listas").await.unwrap();
    let reply = session.handle("criar lista chamada Revisão").await.unwrap();
    assert!(reply.starts_with("✅ Lista 'Revisão' criada com sucesso!"));

    let listing = session.handle("mostrar listas").await.unwrap();
    assert!(listing.contains("Revisão"));
    assert_eq!(boards.calls_with("list_lists", DEFAULT_BOARD), 2);
}

#[tokio::test]
async fn test_create_board_adds_default_lists() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    session.handle("mostrar quadros").await.unwrap();
    let reply = session
        .handle("criar quadro chamado Vendas com descrição pipeline comercial")
        .await
        .unwrap();
    assert!(reply.starts_with("✅ Quadro 'Vendas' criado com sucesso!"));
    assert!(reply.contains("Listas criadas: A Fazer, Em Andamento, Concluído"));
    assert_eq!(boards.calls("create_list"), 3);

    let listing = session.handle("mostrar quadros").await.unwrap();
    assert!(listing.contains("Vendas"));
    assert_eq!(boards.calls("list_boards"), 2);
}

#[tokio::test]
async fn test_delete_board_needs_confirmation() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let warning = session
        .handle("apagar quadro com url https://trello.com/b/XYZ999/marketing")
        .await
        .unwrap();
    assert!(warning.starts_with("⚠️ ATENÇÃO"));
    assert!(warning.contains("'Marketing' (ID: XYZ999)"));
    assert_eq!(session.pending().len(), 1);
    assert_eq!(boards.calls("delete_board"), 0);

    let done = session.handle("sim").await.unwrap();
    assert_eq!(done, "✅ Quadro 'Marketing' (ID: XYZ999) apagado com sucesso!");
    assert!(!session.pending().is_pending());
    assert_eq!(boards.calls_with("delete_board", OTHER_BOARD), 1);
    assert_eq!(boards.board_names(), vec!["Produto"]);

    // Nothing pending: "sim" is plain chat again
    assert_eq!(session.dispatch("sim").await, Dispatch::Forward { note: None });
}

#[tokio::test]
async fn test_confirm_clears_pending_despite_failures() {
    let boards = FakeBoardService::with_fixture();
    boards.fail_delete(DEFAULT_BOARD);
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    session.handle("apagar quadro com id AAA111").await.unwrap();
    session.handle("excluir quadro com id XYZ999").await.unwrap();
    // Same board twice stays one entry
    session.handle("apagar quadro com id XYZ999").await.unwrap();
    assert_eq!(session.pending().len(), 2);

    let report = session.handle("confirmar").await.unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("❌ Erro ao apagar quadro 'Produto'"));
    assert!(lines[1].starts_with("✅ Quadro 'Marketing'"));

    assert!(session.pending().is_empty());
    assert_eq!(boards.calls("delete_board"), 2);
}

#[tokio::test]
async fn test_delete_unknown_board_queues_nothing() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("apagar quadro com id NOPE42").await.unwrap();
    assert!(reply.starts_with("❌ Serviço respondeu 404"));
    assert!(session.pending().is_empty());
}

#[tokio::test]
async fn test_search_card_across_boards() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("buscar card chamado relatório")
        .await
        .unwrap();
    assert_eq!(
        reply,
        "🔍 Card encontrado: Relatório mensal\nQuadro: Produto\nLista: Em Andamento\nURL: https://trello.com/c/c2"
    );
}

#[tokio::test]
async fn test_search_card_in_named_board_reports_all_matches() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session
        .handle("buscar card chamado post no quadro Marketing")
        .await
        .unwrap();
    assert!(reply.starts_with("🔍 Encontrados 2 cards correspondentes"));
    assert!(reply.contains("1. Card: Post blog"));
    assert!(reply.contains("2. Card: Post newsletter"));
    assert!(reply.contains("Lista: Campanhas"));
    assert_eq!(boards.calls_with("list_board_cards", OTHER_BOARD), 1);
}

#[tokio::test]
async fn test_search_card_without_match() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("buscar card chamado inexistente").await.unwrap();
    assert_eq!(reply, "ℹ️ Nenhum card encontrado com o termo 'inexistente'.");
}

#[tokio::test]
async fn test_recent_activity_limit() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("mostrar atividades do trello").await.unwrap();
    assert!(reply.starts_with("📊 10 Atividades Recentes"));
    assert!(reply.contains("• 2024-03-01 10:22:05 - Ana: createCard 'Deploy API'"));
    assert_eq!(boards.calls_with("recent_activity", "AAA111:10"), 1);

    session
        .handle("mostrar as últimas 5 atividades do trello")
        .await
        .unwrap();
    assert_eq!(boards.calls_with("recent_activity", "AAA111:5"), 1);
}

#[tokio::test]
async fn test_service_failure_is_a_reply() {
    let boards = FakeBoardService::with_fixture();
    boards.set_outage(401);
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    let reply = session.handle("mostrar quadros").await.unwrap();
    assert_eq!(reply, "❌ Serviço respondeu 401: invalid token");
}

#[tokio::test]
async fn test_non_commands_are_forwarded() {
    let boards = FakeBoardService::with_fixture();
    let tasks = FakeTaskService::new();
    let mut session = common::session(&boards, &tasks);

    assert_eq!(
        session.dispatch("qual a capital da França?").await,
        Dispatch::Forward { note: None }
    );
    match session.dispatch("o que é um quadro kanban?").await {
        Dispatch::Forward { note: Some(note) } => assert!(note.contains("esclarecimentos")),
        other => panic!("expected a forward with a note, got {:?}", other),
    }
    assert!(session.handle("qual a capital da França?").await.is_none());
}
