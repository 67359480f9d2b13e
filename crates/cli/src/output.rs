//! Plain-text rendering for terminal output.

use iicgp_core::access::NavItem;
use iicgp_core::culto::Culto;
use iicgp_core::dashboard::{initials, DashboardStats};
use iicgp_core::presence::RosterEntry;
use iicgp_core::stats::{display_count, display_rate, ReportSnapshot, PLACEHOLDER};
use iicgp_core::user::CurrentUser;

pub fn user(user: &CurrentUser) {
    println!("{} (#{})", user.username, user.id);
    println!("  Função: {}", user.role_display());
    if let Some(created) = &user.data_criacao {
        println!("  Criado: {}", created.get(..10).unwrap_or(created));
    }
}

pub fn menu(items: &[NavItem]) {
    for item in items {
        println!("{}", item.label);
        for child in &item.children {
            println!("  - {}", child.label);
        }
    }
}

pub fn cultos(cultos: &[Culto]) {
    if cultos.is_empty() {
        println!("Nenhum culto registado.");
        return;
    }
    println!("{:>5}  {:<10}  {:<5}  {:<32}  {:<12}  {:>9}", "ID", "Data", "Hora", "Tipo", "Categoria", "Presentes");
    for culto in cultos {
        println!(
            "{:>5}  {:<10}  {:<5}  {:<32}  {:<12}  {:>9}",
            culto.id,
            culto.data.format("%d/%m/%Y"),
            culto.horario.as_deref().map(|h| h.get(..5).unwrap_or(h)).unwrap_or(PLACEHOLDER),
            culto.tipo,
            culto.categoria.as_deref().unwrap_or(PLACEHOLDER),
            culto.total_presentes,
        );
        if let Some(pregador) = &culto.pregador {
            println!("{:>5}  Pregador: {pregador}", "");
        }
    }
}

pub fn roster(entries: &[RosterEntry]) {
    if entries.is_empty() {
        println!("Nenhum membro encontrado.");
        return;
    }
    for entry in entries {
        let mark = if entry.presente { "[x]" } else { "[ ]" };
        println!(
            "{mark} {:>5}  {:<8}  {:<32}  {}",
            entry.membro_id,
            entry.codigo.as_deref().unwrap_or(PLACEHOLDER),
            entry.nome_membro,
            entry.nome_branch.as_deref().unwrap_or(PLACEHOLDER),
        );
        if let Some(obs) = &entry.observacao {
            println!("{:>13}  obs: {obs}", "");
        }
    }
}

pub fn tally(label: &str, snapshot: &ReportSnapshot) {
    println!(
        "{label}: {} presentes, {} ausentes, {} total ({})",
        snapshot.presentes,
        snapshot.ausentes,
        snapshot.total,
        snapshot.rate_display()
    );
}

/// Report card; `None` renders placeholders.
pub fn report(snapshot: Option<&ReportSnapshot>) {
    println!("Total de membros: {}", display_count(snapshot.map(|s| s.total)));
    println!("Presentes:        {}", display_count(snapshot.map(|s| s.presentes)));
    println!("Ausentes:         {}", display_count(snapshot.map(|s| s.ausentes)));
    println!("Taxa de presença: {}", display_rate(snapshot));
}

pub fn member_list(title: &str, entries: &[&RosterEntry]) {
    println!("{title} ({})", entries.len());
    for entry in entries {
        println!("  {:<32}  {}", entry.nome_membro, entry.nome_branch.as_deref().unwrap_or(""));
    }
}

pub fn dashboard(stats: &DashboardStats) {
    println!("== Visão geral ==");
    match &stats.gerais {
        Some(g) => {
            println!("Cultos:            {}", g.total_cultos);
            println!("Presenças:         {}", g.total_presencas);
            println!("Membros:           {}", g.total_membros);
            println!("Média por culto:   {:.1}", g.media_por_culto);
        }
        None => println!("{PLACEHOLDER}"),
    }

    println!("\n== Presenças por mês ==");
    section(&stats.por_mes, |rows| {
        for r in rows {
            println!("{:<8}  {:>4} presentes  {:>4} ausentes  {:>5.1}%", r.mes, r.presentes, r.ausentes, r.taxa_presenca);
        }
    });

    println!("\n== Presenças por culto ==");
    section(&stats.por_culto, |rows| {
        for r in rows {
            println!(
                "{:<6}  {:<32}  {:>4} / {:<4}  {:>5.1}%",
                r.data_curta,
                r.tipo.as_deref().unwrap_or(PLACEHOLDER),
                r.presentes,
                r.presentes + r.ausentes,
                r.taxa_presenca
            );
        }
    });

    println!("\n== Mais assíduos ==");
    section(&stats.mais_assiduos, |rows| {
        for r in rows {
            println!("({:<2}) {:<32}  {:>4}", initials(&r.nome_membro), r.nome_membro, r.total_presencas);
        }
    });

    println!("\n== Mais faltas ==");
    section(&stats.mais_faltas, |rows| {
        for r in rows {
            println!("({:<2}) {:<32}  {:>4}", initials(&r.nome_membro), r.nome_membro, r.total_faltas);
        }
    });

    println!("\n== Melhor culto ==");
    section(&stats.melhor_culto, |rows| {
        for r in rows {
            println!(
                "{:<6}  {:<32}  {:>4} presentes",
                r.data_curta.as_deref().unwrap_or(PLACEHOLDER),
                r.tipo,
                r.presentes
            );
        }
    });
}

fn section<T>(rows: &Option<Vec<T>>, render: impl FnOnce(&[T])) {
    match rows {
        Some(rows) if rows.is_empty() => println!("Sem dados."),
        Some(rows) => render(rows),
        None => println!("{PLACEHOLDER}"),
    }
}
